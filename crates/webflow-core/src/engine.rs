//! The browser automation seam.
//!
//! Replay only ever talks to a page through [`AutomationEngine`]. The CDP
//! driver in `webflow-browser` is the production implementation.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::FieldAttributes;
use crate::error::EngineError;

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Query {
    Css { selector: String },
    #[serde(rename = "xpath")]
    XPath { path: String },
    /// Element with the given ARIA role whose accessible name contains `name`,
    /// case-insensitively.
    Role { role: String, name: String },
    /// Element whose visible text contains `text`, case-insensitively.
    Text { text: String },
}

impl Query {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Self::XPath { path: path.into() }
    }

    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { selector } => write!(f, "css={selector}"),
            Self::XPath { path } => write!(f, "xpath={path}"),
            Self::Role { role, name } => write!(f, "role={role}[name~=\"{name}\"]"),
            Self::Text { text } => write!(f, "text~=\"{text}\""),
        }
    }
}

/// What to do with a located element.
#[derive(Clone, PartialEq, Eq)]
pub enum Action {
    /// Click the element's center. `force` skips the actionability checks
    /// and dispatches the click on the element directly.
    Click { force: bool },
    /// Replace the element's value.
    Fill(String),
}

// Fill values are frequently credentials.
impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click { force } => f.debug_struct("Click").field("force", force).finish(),
            Self::Fill(value) => f
                .debug_tuple("Fill")
                .field(&format_args!("<{} chars>", value.chars().count()))
                .finish(),
        }
    }
}

/// A page state to wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCondition {
    /// The page address differs from `from`.
    UrlChanged { from: String },
    /// No network activity for a short quiet period.
    NetworkIdle,
    /// The document has been parsed.
    DomReady,
}

impl fmt::Display for PageCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UrlChanged { .. } => f.write_str("url change"),
            Self::NetworkIdle => f.write_str("network idle"),
            Self::DomReady => f.write_str("dom ready"),
        }
    }
}

/// A visible form field the engine found on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCandidate {
    pub query: Query,
    pub attributes: FieldAttributes,
}

/// Drives a single browser page.
#[async_trait]
pub trait AutomationEngine: Send + Sync {
    /// Load `url` and wait up to `timeout` for `until`.
    async fn navigate(
        &self,
        url: &str,
        until: PageCondition,
        timeout: Duration,
    ) -> Result<(), EngineError>;

    /// The page's current address.
    async fn current_url(&self) -> Result<String, EngineError>;

    /// Number of elements matching `query`, visible or not.
    async fn count(&self, query: &Query) -> Result<usize, EngineError>;

    /// Wait up to `timeout` for a visible match. `Ok(false)` on timeout.
    async fn wait_for_visible(&self, query: &Query, timeout: Duration) -> Result<bool, EngineError>;

    /// Perform `action` on the first visible match of `query`.
    async fn act(&self, query: &Query, action: &Action) -> Result<(), EngineError>;

    /// Press and release a named key on the focused element.
    async fn press_key(&self, key: &str) -> Result<(), EngineError>;

    /// Wait up to `timeout` for `condition`. `Ok(false)` on timeout.
    async fn wait_for(&self, condition: &PageCondition, timeout: Duration)
    -> Result<bool, EngineError>;

    /// Visible editable fields on the current page, in document order.
    async fn input_fields(&self) -> Result<Vec<FieldCandidate>, EngineError>;

    /// Evaluate a script in the page and return its JSON result.
    ///
    /// With `args`, `script` must be a function expression; it is called
    /// with the arguments.
    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value, EngineError>;
}

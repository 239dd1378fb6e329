//! Locator resolution: turn a recorded element descriptor into a live
//! element on the replay page.

use std::fmt;
use std::time::Duration;

use tracing::{debug, trace};

use crate::engine::{AutomationEngine, Query};
use crate::error::ResolveError;
use crate::event::{non_empty, ElementDescriptor};
use crate::selector::css_escape;

/// Where a candidate locator came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    Structural,
    Id,
    RoleName,
    InteractiveText,
    Positional,
    NameAttribute,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Structural => "structural",
            Self::Id => "id",
            Self::RoleName => "role",
            Self::InteractiveText => "text",
            Self::Positional => "positional",
            Self::NameAttribute => "name",
        };
        f.write_str(name)
    }
}

/// A candidate query and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub strategy: Strategy,
    pub query: Query,
}

/// Candidate locators for `el`, most specific first, without duplicates.
pub fn candidates(el: &ElementDescriptor) -> Vec<Locator> {
    let mut out: Vec<Locator> = Vec::new();
    let mut push = |strategy: Strategy, query: Query| {
        if !out.iter().any(|l| l.query == query) {
            out.push(Locator { strategy, query });
        }
    };

    if let Some(css) = non_empty(&el.selectors.css) {
        push(Strategy::Structural, Query::css(css));
    }
    if let Some(id) = non_empty(&el.id) {
        push(Strategy::Id, Query::css(format!("#{}", css_escape(id))));
    }
    if let (Some(role), Some(name)) = (non_empty(&el.role), el.accessible_name()) {
        push(Strategy::RoleName, Query::role(role, trim_ellipsis(name)));
    }
    if let (Some(role), Some(text)) = (implicit_role(el), non_empty(&el.text)) {
        let text = trim_ellipsis(text);
        push(Strategy::InteractiveText, Query::role(role, text));
        push(Strategy::InteractiveText, Query::text(text));
    }
    if let Some(xpath) = non_empty(&el.selectors.xpath) {
        push(Strategy::Positional, Query::xpath(xpath));
    }
    if let Some(name) = non_empty(&el.name) {
        push(
            Strategy::NameAttribute,
            Query::css(format!("[name=\"{}\"]", name.replace('\\', "\\\\").replace('"', "\\\""))),
        );
    }
    out
}

/// Role of clickable elements that users pick out by their label.
fn implicit_role(el: &ElementDescriptor) -> Option<&'static str> {
    let input_type = el.input_type.as_deref().unwrap_or("").to_ascii_lowercase();
    match (el.tag(), el.role.as_deref()) {
        (_, Some("button")) | ("button", _) => Some("button"),
        (_, Some("link")) | ("a", _) => Some("link"),
        ("input", _) if matches!(input_type.as_str(), "submit" | "button" | "reset") => Some("button"),
        _ => None,
    }
}

/// Recorded text previews are cut with a trailing `...`.
fn trim_ellipsis(text: &str) -> &str {
    text.strip_suffix("...").map(str::trim_end).unwrap_or(text)
}

/// Tries candidates in order until one shows a visible element.
#[derive(Debug, Clone)]
pub struct LocatorResolver {
    candidate_timeout: Duration,
}

impl LocatorResolver {
    pub fn new(candidate_timeout: Duration) -> Self {
        Self { candidate_timeout }
    }

    /// Resolve `el` to the first candidate with a visible match.
    ///
    /// Each candidate gets the full per-candidate timeout. Engine errors on a
    /// candidate count as a miss, except disconnects, which end resolution.
    pub async fn resolve(
        &self,
        engine: &dyn AutomationEngine,
        el: &ElementDescriptor,
    ) -> Result<Locator, ResolveError> {
        let candidates = candidates(el);
        let attempted = candidates.len();

        for locator in candidates {
            trace!(strategy = %locator.strategy, query = %locator.query, "Trying locator");
            match engine.wait_for_visible(&locator.query, self.candidate_timeout).await {
                Ok(true) => {
                    debug!(strategy = %locator.strategy, query = %locator.query, "Locator resolved");
                    return Ok(locator);
                }
                Ok(false) => {}
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => debug!(query = %locator.query, error = %e, "Locator candidate failed"),
            }
        }

        Err(ResolveError::NotFound { attempted })
    }
}

#[cfg(test)]
#[path = "locate_tests.rs"]
mod tests;

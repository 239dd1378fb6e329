//! Recorded events and the element descriptors they carry.
//!
//! One event is one JSON object per line in a session log. The wire shape is
//! flat: the common fields (`etype`, `t`, `url`, `meta`) sit next to the
//! kind-specific ones.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single recorded user interaction or page transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Capture time, UTC with millisecond precision.
    #[serde(with = "timestamp")]
    pub t: DateTime<Utc>,

    /// Page address at capture time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Free-form annotations (`reason`, `probe`, ...).
    #[serde(default)]
    pub meta: Map<String, Value>,

    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    /// Create an event stamped with the current time.
    pub fn now(payload: EventPayload, url: Option<String>) -> Self {
        Self::at(Utc::now(), payload, url)
    }

    /// Create an event stamped with `t`, truncated to milliseconds.
    pub fn at(t: DateTime<Utc>, payload: EventPayload, url: Option<String>) -> Self {
        Self {
            t: t.trunc_subsecs(3),
            url,
            meta: Map::new(),
            payload,
        }
    }

    /// Attach a `meta` entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Target element, for kinds that have one.
    pub fn element(&self) -> Option<&ElementDescriptor> {
        match &self.payload {
            EventPayload::Click { el, .. }
            | EventPayload::Input { el, .. }
            | EventPayload::Change { el, .. }
            | EventPayload::Submit { el } => el.as_ref(),
            _ => None,
        }
    }

    /// Field value carried by `input` and `change` events.
    pub fn value(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Input { input_value, .. } => input_value.as_deref(),
            EventPayload::Change { value, .. } => value.as_deref(),
            _ => None,
        }
    }

    /// The `meta.reason` annotation, if any.
    pub fn reason(&self) -> Option<&str> {
        self.meta.get("reason").and_then(Value::as_str)
    }

    /// Whether this is a diagnostics probe rather than a user action.
    pub fn is_probe(&self) -> bool {
        self.meta.get("probe").and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Kind-specific event fields, tagged by `etype`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "etype", rename_all = "lowercase")]
pub enum EventPayload {
    Nav {
        #[serde(default)]
        from_url: Option<String>,
        #[serde(default)]
        to_url: Option<String>,
    },
    Click {
        x: f64,
        y: f64,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        el: Option<ElementDescriptor>,
    },
    Input {
        #[serde(default)]
        el: Option<ElementDescriptor>,
        #[serde(default)]
        input_value: Option<String>,
    },
    Keydown {
        key: String,
        #[serde(default)]
        code: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        alt: bool,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        meta_key: bool,
    },
    Change {
        #[serde(default)]
        el: Option<ElementDescriptor>,
        #[serde(default)]
        value: Option<String>,
    },
    Submit {
        #[serde(default)]
        el: Option<ElementDescriptor>,
    },
    Visibility {
        state: VisibilityState,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Nav { .. } => EventKind::Nav,
            Self::Click { .. } => EventKind::Click,
            Self::Input { .. } => EventKind::Input,
            Self::Keydown { .. } => EventKind::Keydown,
            Self::Change { .. } => EventKind::Change,
            Self::Submit { .. } => EventKind::Submit,
            Self::Visibility { .. } => EventKind::Visibility,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Nav,
    Click,
    Input,
    Keydown,
    Change,
    Submit,
    Visibility,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Nav,
        EventKind::Click,
        EventKind::Input,
        EventKind::Keydown,
        EventKind::Change,
        EventKind::Submit,
        EventKind::Visibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nav => "nav",
            Self::Click => "click",
            Self::Input => "input",
            Self::Keydown => "keydown",
            Self::Change => "change",
            Self::Submit => "submit",
            Self::Visibility => "visibility",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mouse button as reported by `MouseEvent.button`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum MouseButton {
    #[default]
    Primary,
    Auxiliary,
    Secondary,
    Other(i64),
}

impl From<i64> for MouseButton {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

impl From<MouseButton> for i64 {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Primary => 0,
            MouseButton::Auxiliary => 1,
            MouseButton::Secondary => 2,
            MouseButton::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityState {
    Visible,
    Hidden,
    Prerender,
}

/// Everything recorded about an event's target element.
///
/// All attributes are optional; pages routinely omit most of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Lowercase tag name.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "ariaLabel", alias = "aria_label")]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Whitespace-collapsed visible text, truncated.
    #[serde(default)]
    pub text: Option<String>,
    /// Truncated current value of form controls.
    #[serde(default)]
    pub value_preview: Option<String>,
    #[serde(default)]
    pub selectors: Selectors,
}

impl ElementDescriptor {
    /// Tag name, or an empty string when unknown.
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or("")
    }

    /// Short human-readable label for logs.
    pub fn label(&self) -> String {
        let mut label = self.tag().to_string();
        if let Some(id) = non_empty(&self.id) {
            label.push('#');
            label.push_str(id);
        } else if let Some(name) = non_empty(&self.name) {
            label.push_str(&format!("[name={name}]"));
        }
        if let Some(text) = non_empty(&self.text) {
            label.push_str(&format!(" \"{text}\""));
        }
        label
    }

    /// The accessible name a user would see: aria-label, then title, then text.
    pub fn accessible_name(&self) -> Option<&str> {
        non_empty(&self.aria_label)
            .or_else(|| non_empty(&self.title))
            .or_else(|| non_empty(&self.text))
    }
}

/// Locators synthesized at capture time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    /// Structural CSS path.
    #[serde(default)]
    pub css: Option<String>,
    /// Positional XPath.
    #[serde(default)]
    pub xpath: Option<String>,
}

/// Borrow an optional string, treating blank as absent.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Millisecond ISO-8601 timestamps with a `Z` suffix.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&t.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(t) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(t.with_timezone(&Utc));
        }
        // Offset-less timestamps are taken as UTC.
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

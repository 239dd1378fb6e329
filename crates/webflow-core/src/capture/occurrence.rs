//! Occurrences as reported by the in-page recorder.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::classify::{classify, FieldAttributes};
use crate::error::CaptureError;
use crate::event::{ElementDescriptor, Event, EventKind, EventPayload, VisibilityState};
use crate::redaction::{RedactionPolicy, REDACTION_MARKER};
use crate::selector::{synthesize, PathSegment};

/// Longest text preview kept on a descriptor, in characters.
pub const TEXT_PREVIEW_LIMIT: usize = 60;

/// Longest value preview kept on a descriptor, in characters.
pub const VALUE_PREVIEW_LIMIT: usize = 40;

/// One raw page occurrence, before selectors, classification or masking.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOccurrence {
    pub etype: Option<EventKind>,
    /// Epoch milliseconds, as `Date.now()` reports them.
    pub t: Option<f64>,
    pub url: Option<String>,
    pub meta: Map<String, Value>,
    pub target: Option<RawTarget>,
    pub x: f64,
    pub y: f64,
    pub button: i64,
    pub key: Option<String>,
    pub code: Option<String>,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta_key: bool,
    pub value: Option<String>,
    pub state: Option<VisibilityState>,
    pub from_url: Option<String>,
    pub to_url: Option<String>,
}

/// The element an occurrence targeted, with its ancestor chain.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTarget {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "ariaLabel", alias = "aria_label")]
    pub aria_label: Option<String>,
    pub title: Option<String>,
    pub placeholder: Option<String>,
    pub text: Option<String>,
    pub value: Option<String>,
    /// Target first, document root last.
    pub lineage: Vec<PathSegment>,
}

impl RawTarget {
    fn attributes(&self) -> FieldAttributes {
        FieldAttributes {
            id: self.id.clone(),
            name: self.name.clone(),
            placeholder: self.placeholder.clone(),
            aria_label: self.aria_label.clone(),
            input_type: self.input_type.clone(),
        }
    }

    fn into_descriptor(self) -> ElementDescriptor {
        let selectors = synthesize(&self.lineage);
        ElementDescriptor {
            tag: self.tag.map(|t| t.to_ascii_lowercase()),
            id: blank_to_none(self.id),
            classes: self.classes.into_iter().filter(|c| !c.is_empty()).collect(),
            name: blank_to_none(self.name),
            input_type: blank_to_none(self.input_type),
            role: blank_to_none(self.role),
            aria_label: blank_to_none(self.aria_label),
            title: blank_to_none(self.title),
            placeholder: blank_to_none(self.placeholder),
            text: self.text.as_deref().map(text_preview).filter(|t| !t.is_empty()),
            value_preview: self.value.as_deref().map(|v| truncate(v, VALUE_PREVIEW_LIMIT)),
            selectors,
        }
    }
}

impl RawOccurrence {
    pub fn from_json(payload: &str) -> Result<Self, CaptureError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Build the event, synthesizing selectors for its target.
    ///
    /// Printable keys typed into a field `policy` masks are masked here,
    /// since key events carry no element for redaction to inspect later.
    pub fn into_event(self, policy: &RedactionPolicy) -> Result<Event, CaptureError> {
        let kind = self
            .etype
            .ok_or_else(|| CaptureError::Payload("missing etype".to_string()))?;
        let t = self
            .t
            .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms as i64))
            .unwrap_or_else(Utc::now);
        let masked_target = self
            .target
            .as_ref()
            .is_some_and(|target| policy.masks(classify(&target.attributes())));
        let el = self.target.map(RawTarget::into_descriptor);

        let payload = match kind {
            EventKind::Nav => EventPayload::Nav {
                from_url: self.from_url,
                to_url: self.to_url.or_else(|| self.url.clone()),
            },
            EventKind::Click => EventPayload::Click {
                x: self.x,
                y: self.y,
                button: self.button.into(),
                el,
            },
            EventKind::Input => EventPayload::Input {
                el,
                input_value: self.value,
            },
            EventKind::Change => EventPayload::Change { el, value: self.value },
            EventKind::Submit => EventPayload::Submit { el },
            EventKind::Keydown => {
                let mut key = self
                    .key
                    .ok_or_else(|| CaptureError::Payload("keydown without key".to_string()))?;
                let mut code = self.code.unwrap_or_default();
                if masked_target && key.chars().count() == 1 {
                    key = REDACTION_MARKER.to_string();
                    code = REDACTION_MARKER.to_string();
                }
                EventPayload::Keydown {
                    key,
                    code,
                    ctrl: self.ctrl,
                    alt: self.alt,
                    shift: self.shift,
                    meta_key: self.meta_key,
                }
            }
            EventKind::Visibility => EventPayload::Visibility {
                state: self
                    .state
                    .ok_or_else(|| CaptureError::Payload("visibility without state".to_string()))?,
            },
        };

        let mut event = Event::at(t, payload, self.url);
        event.meta = self.meta;
        Ok(event)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Collapse whitespace runs and trim, then truncate.
pub fn text_preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&collapsed, TEXT_PREVIEW_LIMIT)
}

/// Cut to at most `limit` characters, marking the cut with `...`.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
#[path = "occurrence_tests.rs"]
mod tests;

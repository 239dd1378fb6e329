//! Masking of credential values before anything reaches disk.

use std::collections::HashSet;

use tracing::debug;

use crate::classify::{classify, FieldAttributes, FieldKind};
use crate::event::{ElementDescriptor, Event, EventPayload};

/// Stands in for a masked value. Never a plausible real input.
pub const REDACTION_MARKER: &str = "••••••";

/// Whether a stored value has been masked.
pub fn is_redacted(value: &str) -> bool {
    value == REDACTION_MARKER
}

/// Decides which values get masked and masks them.
///
/// Secret fields are always masked. Identity fields are masked when
/// `redact_identity` is set. A value that was masked once is masked wherever
/// it shows up again for the rest of the session, whatever field it lands in.
#[derive(Debug, Default)]
pub struct RedactionPolicy {
    redact_identity: bool,
    masked: HashSet<String>,
}

impl RedactionPolicy {
    pub fn new(redact_identity: bool) -> Self {
        Self {
            redact_identity,
            masked: HashSet::new(),
        }
    }

    /// Whether a field of this kind gets masked.
    pub fn masks(&self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::Secret => true,
            FieldKind::Identity => self.redact_identity,
            FieldKind::Unclassified => false,
        }
    }

    /// Classify the event's target field and mask its value if needed.
    ///
    /// Applying this to an already masked event changes nothing.
    pub fn classify_and_redact(&mut self, mut event: Event) -> Event {
        let kind = event.element().map(|el| classify(&FieldAttributes::from(el)));
        let masks_field = kind.is_some_and(|k| self.masks(k));

        match &mut event.payload {
            EventPayload::Input { el, input_value: value } | EventPayload::Change { el, value } => {
                let mask = masks_field
                    || value.as_deref().is_some_and(|v| self.seen(v))
                    || el_preview_masked(el.as_ref());
                if mask {
                    self.remember(value.as_deref());
                    *value = Some(REDACTION_MARKER.to_string());
                    if let Some(el) = el.as_mut() {
                        mask_preview(el);
                    }
                    debug!(kind = ?kind, "Masked field value");
                }
            }
            EventPayload::Click { el: Some(el), .. } | EventPayload::Submit { el: Some(el) } => {
                let preview_seen = el.value_preview.as_deref().is_some_and(|v| self.seen(v));
                if el.value_preview.is_some() && (masks_field || preview_seen) {
                    mask_preview(el);
                }
            }
            _ => {}
        }
        event
    }

    fn seen(&self, value: &str) -> bool {
        !value.is_empty() && (is_redacted(value) || self.masked.contains(value))
    }

    fn remember(&mut self, value: Option<&str>) {
        if let Some(v) = value.filter(|v| !v.is_empty() && !is_redacted(v)) {
            self.masked.insert(v.to_string());
        }
    }

    /// Number of distinct values masked so far.
    pub fn masked_count(&self) -> usize {
        self.masked.len()
    }
}

fn el_preview_masked(el: Option<&ElementDescriptor>) -> bool {
    el.and_then(|el| el.value_preview.as_deref())
        .is_some_and(is_redacted)
}

fn mask_preview(el: &mut ElementDescriptor) {
    el.value_preview = Some(REDACTION_MARKER.to_string());
}

#[cfg(test)]
#[path = "redaction_tests.rs"]
mod tests;

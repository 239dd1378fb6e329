//! Credential field classification.
//!
//! The same rules run at capture time (to decide what to mask) and at replay
//! time (to decide which credential fills a masked field), so the two sides
//! always agree.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::event::ElementDescriptor;

static SECRET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)pass(word)?").expect("secret pattern is valid"));

static IDENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)e[-_\s]*mail|user(name)?|log[-_\s]*in|account").expect("identity pattern is valid")
});

/// Which credential a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Identity,
    Secret,
    Unclassified,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Secret => f.write_str("secret"),
            Self::Unclassified => f.write_str("unclassified"),
        }
    }
}

/// The attributes classification looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAttributes {
    pub id: Option<String>,
    pub name: Option<String>,
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    pub input_type: Option<String>,
}

impl FieldAttributes {
    fn haystack(&self) -> String {
        [
            &self.id,
            &self.name,
            &self.placeholder,
            &self.aria_label,
            &self.input_type,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl From<&ElementDescriptor> for FieldAttributes {
    fn from(el: &ElementDescriptor) -> Self {
        Self {
            id: el.id.clone(),
            name: el.name.clone(),
            placeholder: el.placeholder.clone(),
            aria_label: el.aria_label.clone(),
            input_type: el.input_type.clone(),
        }
    }
}

/// Classify a field as identity, secret, or neither.
///
/// Rules, first match wins:
/// 1. `type=password` is a secret.
/// 2. `type=email` is an identity.
/// 3. A secret-like word in any attribute is a secret.
/// 4. An identity-like word in any attribute is an identity.
///
/// Secret words are checked first so a field named `user_password` is masked.
pub fn classify(attrs: &FieldAttributes) -> FieldKind {
    let input_type = attrs
        .input_type
        .as_deref()
        .map(|t| t.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match input_type.as_str() {
        "password" => return FieldKind::Secret,
        "email" => return FieldKind::Identity,
        _ => {}
    }

    let haystack = attrs.haystack();
    if SECRET_PATTERN.is_match(&haystack) {
        FieldKind::Secret
    } else if IDENTITY_PATTERN.is_match(&haystack) {
        FieldKind::Identity
    } else {
        FieldKind::Unclassified
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;

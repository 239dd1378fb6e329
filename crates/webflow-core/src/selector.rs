//! Selector synthesis from an element's ancestor chain.
//!
//! The page reports the raw chain (tag, id, classes and sibling position of
//! each node from the target up to the root); the two locators are derived
//! here so their rules live in one place.

use serde::{Deserialize, Serialize};

use crate::event::Selectors;

/// Maximum segments in a structural path, counting the target itself.
pub const MAX_STRUCTURAL_DEPTH: usize = 6;

/// Maximum segments in a positional path.
pub const MAX_POSITIONAL_DEPTH: usize = 8;

/// One node of an element's ancestor chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    /// Lowercase tag name.
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    /// 1-based position among same-tag siblings.
    #[serde(default = "one", alias = "index")]
    pub same_tag_index: usize,
    /// Number of same-tag siblings, including this node.
    #[serde(default = "one", alias = "count")]
    pub same_tag_count: usize,
}

fn one() -> usize {
    1
}

impl PathSegment {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            same_tag_index: 1,
            same_tag_count: 1,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the sibling position: `index` of `count` same-tag siblings.
    pub fn nth(mut self, index: usize, count: usize) -> Self {
        self.same_tag_index = index.max(1);
        self.same_tag_count = count.max(self.same_tag_index);
        self
    }
}

/// Derive both locators for a chain ordered target-first.
pub fn synthesize(lineage: &[PathSegment]) -> Selectors {
    Selectors {
        css: structural_path(lineage),
        xpath: positional_path(lineage),
    }
}

/// CSS path for the first node of `lineage`.
///
/// A node with an id is addressed by id alone. Otherwise each level
/// contributes its tag and classes, plus `:nth-of-type` when it has same-tag
/// siblings. The document root is left out and the path stops after
/// [`MAX_STRUCTURAL_DEPTH`] segments.
pub fn structural_path(lineage: &[PathSegment]) -> Option<String> {
    let target = lineage.first()?;
    if let Some(id) = target.id.as_deref().filter(|id| !id.is_empty()) {
        return Some(format!("#{}", css_escape(id)));
    }

    let mut parts: Vec<String> = lineage
        .iter()
        .take_while(|seg| seg.tag != "html")
        .take(MAX_STRUCTURAL_DEPTH)
        .filter(|seg| !seg.tag.is_empty())
        .map(|seg| {
            let mut part = seg.tag.clone();
            for class in seg.classes.iter().filter(|c| !c.is_empty()) {
                part.push('.');
                part.push_str(&css_escape(class));
            }
            if seg.same_tag_count > 1 {
                part.push_str(&format!(":nth-of-type({})", seg.same_tag_index));
            }
            part
        })
        .collect();

    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join(" > "))
}

/// XPath of `tag[index]` steps for the first node of `lineage`, root
/// included, capped at [`MAX_POSITIONAL_DEPTH`] steps.
pub fn positional_path(lineage: &[PathSegment]) -> Option<String> {
    let mut steps: Vec<String> = lineage
        .iter()
        .filter(|seg| !seg.tag.is_empty())
        .take(MAX_POSITIONAL_DEPTH)
        .map(|seg| format!("{}[{}]", seg.tag, seg.same_tag_index.max(1)))
        .collect();

    if steps.is_empty() {
        return None;
    }
    steps.reverse();
    Some(format!("//{}", steps.join("/")))
}

/// Escape an identifier for use in a CSS selector, as `CSS.escape` does.
pub fn css_escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());

    for (i, &c) in chars.iter().enumerate() {
        let leading_digit = c.is_ascii_digit() && (i == 0 || (i == 1 && chars[0] == '-'));
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", c as u32)),
            _ if leading_digit => out.push_str(&format!("\\{:x} ", c as u32)),
            '-' if i == 0 && chars.len() == 1 => out.push_str("\\-"),
            c if c as u32 >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;

//! Input (mouse and keyboard) operations for CDP page session.

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::{KeyEventType, MouseButton, MouseEventType};

use super::core::PageSession;

/// What `Input.dispatchKeyEvent` needs to act like a physical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyDefinition {
    pub key: String,
    pub code: String,
    pub key_code: u32,
    /// Text the key produces; keys without text are sent as `rawKeyDown`.
    pub text: Option<String>,
}

impl KeyDefinition {
    fn named(key: &str, key_code: u32) -> Self {
        Self {
            key: key.to_string(),
            code: key.to_string(),
            key_code,
            text: None,
        }
    }

    /// Look up a DOM key name (`"Enter"`, `"ArrowDown"`, `"a"`).
    pub(crate) fn lookup(key: &str) -> Option<Self> {
        let named = match key {
            "Enter" => {
                return Some(Self {
                    text: Some("\r".to_string()),
                    ..Self::named("Enter", 13)
                });
            }
            "Tab" => Self::named("Tab", 9),
            "Escape" => Self::named("Escape", 27),
            "Backspace" => Self::named("Backspace", 8),
            "Delete" => Self::named("Delete", 46),
            "Home" => Self::named("Home", 36),
            "End" => Self::named("End", 35),
            "PageUp" => Self::named("PageUp", 33),
            "PageDown" => Self::named("PageDown", 34),
            "ArrowLeft" => Self::named("ArrowLeft", 37),
            "ArrowUp" => Self::named("ArrowUp", 38),
            "ArrowRight" => Self::named("ArrowRight", 39),
            "ArrowDown" => Self::named("ArrowDown", 40),
            _ => return Self::printable(key),
        };
        Some(named)
    }

    fn printable(key: &str) -> Option<Self> {
        let mut chars = key.chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }

        let upper = c.to_ascii_uppercase();
        let (code, key_code) = match c {
            ' ' => ("Space".to_string(), 32),
            'a'..='z' | 'A'..='Z' => (format!("Key{}", upper), upper as u32),
            '0'..='9' => (format!("Digit{}", c), c as u32),
            _ => (String::new(), 0),
        };
        Some(Self {
            key: key.to_string(),
            code,
            key_code,
            text: Some(key.to_string()),
        })
    }
}

impl PageSession {
    /// Click at coordinates.
    pub async fn click(&self, x: f64, y: f64) -> Result<(), CdpError> {
        self.call(
            "Input.dispatchMouseEvent",
            Some(json!({
                "type": MouseEventType::MouseMoved,
                "x": x,
                "y": y,
                "button": MouseButton::None,
            })),
        )
        .await?;

        for event_type in [MouseEventType::MousePressed, MouseEventType::MouseReleased] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": event_type,
                    "x": x,
                    "y": y,
                    "button": MouseButton::Left,
                    "clickCount": 1,
                })),
            )
            .await?;
        }

        debug!("Clicked at ({}, {})", x, y);
        Ok(())
    }

    /// Insert text at the focused element, as an IME commit would.
    pub async fn insert_text(&self, text: &str) -> Result<(), CdpError> {
        self.call("Input.insertText", Some(json!({"text": text})))
            .await?;
        debug!("Inserted {} characters", text.chars().count());
        Ok(())
    }

    /// Press and release a key on the focused element.
    pub async fn press_key(&self, key: &str) -> Result<(), CdpError> {
        let def = KeyDefinition::lookup(key).ok_or_else(|| CdpError::UnknownKey(key.to_string()))?;

        let mut down = json!({
            "type": if def.text.is_some() { KeyEventType::KeyDown } else { KeyEventType::RawKeyDown },
            "key": def.key,
            "code": def.code,
            "windowsVirtualKeyCode": def.key_code,
        });
        if let Some(text) = &def.text {
            down["text"] = json!(text);
            down["unmodifiedText"] = json!(text);
        }
        self.call("Input.dispatchKeyEvent", Some(down)).await?;

        self.call(
            "Input.dispatchKeyEvent",
            Some(json!({
                "type": KeyEventType::KeyUp,
                "key": def.key,
                "code": def.code,
                "windowsVirtualKeyCode": def.key_code,
            })),
        )
        .await?;

        debug!("Pressed {}", key);
        Ok(())
    }
}

//! Navigation operations for CDP page session.

use serde_json::{json, Value};
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::FrameInfo;

use super::core::PageSession;

/// A navigation the browser accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub frame_id: String,
    /// Absent for same-document navigations (fragment changes).
    pub loader_id: Option<String>,
}

impl PageSession {
    /// Start navigating to `url`.
    ///
    /// Returns once the browser has committed to the navigation; waiting for
    /// the new document is up to the caller.
    pub async fn navigate(&self, url: &str) -> Result<Navigation, CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText").and_then(Value::as_str) {
            return Err(CdpError::NavigationFailed(format!("{}: {}", url, error)));
        }

        let navigation = Navigation {
            frame_id: result["frameId"].as_str().unwrap_or("main").to_string(),
            loader_id: result["loaderId"].as_str().map(|s| s.to_string()),
        };

        debug!("Navigating to {}", url);
        Ok(navigation)
    }

    /// Current `document.readyState`.
    pub async fn ready_state(&self) -> Result<String, CdpError> {
        let result = self.evaluate("document.readyState").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    /// Get current URL.
    pub async fn get_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    /// Every frame on the page, main frame first.
    pub async fn frame_tree(&self) -> Result<Vec<FrameInfo>, CdpError> {
        let result = self.call("Page.getFrameTree", None).await?;
        let mut frames = Vec::new();
        Self::flatten_frames(&result["frameTree"], &mut frames)?;
        Ok(frames)
    }

    /// Main frame ID.
    pub async fn main_frame_id(&self) -> Result<String, CdpError> {
        self.frame_tree()
            .await?
            .into_iter()
            .find(FrameInfo::is_main)
            .map(|frame| frame.id)
            .ok_or_else(|| CdpError::InvalidResponse("Frame tree has no main frame".to_string()))
    }

    pub(super) fn flatten_frames(node: &Value, out: &mut Vec<FrameInfo>) -> Result<(), CdpError> {
        if node.is_null() {
            return Ok(());
        }
        out.push(serde_json::from_value(node["frame"].clone())?);
        if let Some(children) = node["childFrames"].as_array() {
            for child in children {
                Self::flatten_frames(child, out)?;
            }
        }
        Ok(())
    }
}

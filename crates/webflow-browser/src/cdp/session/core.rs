//! Core session struct and CDP command dispatch.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::debug;

use crate::cdp::client::Connection;
use crate::cdp::error::CdpError;
use crate::cdp::protocol::CdpEvent;

/// A session attached to a single page/target.
pub struct PageSession {
    /// Target ID.
    pub(super) target_id: String,
    /// Session ID for this target.
    pub(super) session_id: String,
    /// Websocket shared with the client.
    pub(super) conn: Arc<Connection>,
    /// Template receiver; the client owns the only sender, so the stream
    /// closes when the connection does.
    pub(super) events: broadcast::Receiver<CdpEvent>,
}

impl PageSession {
    /// Create a new page session.
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        conn: Arc<Connection>,
        events: broadcast::Receiver<CdpEvent>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            conn,
            events,
        }
    }

    /// Get target ID.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Get session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the underlying connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.conn.is_closed()
    }

    /// Receive events for this page from now on.
    ///
    /// The stream ends (`RecvError::Closed`) when the connection drops.
    pub fn subscribe(&self) -> broadcast::Receiver<CdpEvent> {
        self.events.resubscribe()
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.conn.call(method, params, Some(&self.session_id)).await
    }

    /// Enable required CDP domains.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        self.call(
            "Page.setLifecycleEventsEnabled",
            Some(json!({"enabled": true})),
        )
        .await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Fix the page viewport size.
    pub async fn set_viewport(&self, width: u32, height: u32) -> Result<(), CdpError> {
        self.call(
            "Emulation.setDeviceMetricsOverride",
            Some(json!({
                "width": width,
                "height": height,
                "deviceScaleFactor": 0,
                "mobile": false,
            })),
        )
        .await?;
        Ok(())
    }
}

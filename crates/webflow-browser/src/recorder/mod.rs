//! In-page capture bridge.
//!
//! The recorder script reports raw page occurrences as JSON strings through a
//! `Runtime.addBinding` function; [`CdpRecorder`] forwards those strings to the
//! capture pipeline untouched.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::cdp::{CdpError, CdpEvent, ExecutionContextDescription, PageSession};

/// Name of the page binding occurrences arrive through.
pub const BRIDGE_BINDING: &str = "__webflowBridge";

const RECORDER_JS: &str = include_str!("recorder.js");

const STOP_JS: &str = "window.__webflowRecorder && window.__webflowRecorder.stop()";

const PROBE_JS: &str = r#"(binding) => {
  const bridge = window[binding];
  if (typeof bridge !== "function") return false;
  bridge(JSON.stringify({
    etype: "visibility",
    t: Date.now(),
    url: location.href,
    state: document.visibilityState,
    meta: { probe: true },
  }));
  return true;
}"#;

/// The recorder script bound to one capture session.
fn recorder_script(token: &str) -> String {
    RECORDER_JS
        .replace("__WEBFLOW_TOKEN__", &json!(token).to_string())
        .replace("__WEBFLOW_BINDING__", &json!(BRIDGE_BINDING).to_string())
}

/// Records one page into a payload channel.
pub struct CdpRecorder {
    page: Arc<PageSession>,
    token: String,
    script_id: String,
    stop_tx: Option<oneshot::Sender<()>>,
    forwarder: Option<JoinHandle<usize>>,
}

impl CdpRecorder {
    /// Install the recorder on `page` and forward its payloads to `sink`.
    ///
    /// The script is registered for every future document, run in the current
    /// one, and re-run in each new default execution context.
    pub async fn install(
        page: Arc<PageSession>,
        sink: mpsc::UnboundedSender<String>,
    ) -> Result<Self, CdpError> {
        let token = Uuid::new_v4().to_string();
        let script: Arc<str> = recorder_script(&token).into();

        let events = page.subscribe();
        page.add_binding(BRIDGE_BINDING).await?;
        let script_id = page.add_script_on_new_document(&script).await?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let forwarder = tokio::spawn(forward(page.clone(), events, script.clone(), sink, stop_rx));

        match page.evaluate(&script).await {
            Ok(status) => debug!(status = %status, "Recorder evaluated in current document"),
            Err(e) if e.is_disconnect() => return Err(e),
            // The next document picks it up from the new-document script.
            Err(e) => warn!("Recorder not installed in current document: {}", e),
        }
        info!(token = %token, binding = BRIDGE_BINDING, "Recorder installed");

        Ok(Self {
            page,
            token,
            script_id,
            stop_tx: Some(stop_tx),
            forwarder: Some(forwarder),
        })
    }

    /// Token identifying this capture session in the page.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a synthetic `visibility` occurrence marked `meta.probe` through the
    /// bridge. Returns whether the bridge was there to take it.
    pub async fn probe(&self) -> Result<bool, CdpError> {
        let sent = self
            .page
            .call_function(PROBE_JS, &[json!(BRIDGE_BINDING)])
            .await?;
        Ok(sent.as_bool().unwrap_or(false))
    }

    /// Stop recording. Occurrences that reached the browser before the stop
    /// are still forwarded. Returns how many payloads were forwarded in total.
    pub async fn stop(mut self) -> Result<usize, CdpError> {
        let stopped = self.page.evaluate(STOP_JS).await;
        let removed = self.page.remove_script_on_new_document(&self.script_id).await;

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        let forwarded = match self.forwarder.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => 0,
        };
        info!(forwarded, "Recorder stopped");

        stopped?;
        removed?;
        Ok(forwarded)
    }
}

impl Drop for CdpRecorder {
    fn drop(&mut self) {
        if let Some(task) = self.forwarder.take() {
            task.abort();
        }
    }
}

/// Relay bridge payloads to `sink` and re-install the recorder in new contexts
/// until stopped or the page goes away.
async fn forward(
    page: Arc<PageSession>,
    mut events: broadcast::Receiver<CdpEvent>,
    script: Arc<str>,
    sink: mpsc::UnboundedSender<String>,
    mut stop_rx: oneshot::Receiver<()>,
) -> usize {
    let mut forwarded = 0;
    loop {
        tokio::select! {
            biased;
            received = events.recv() => match received {
                Ok(event) => {
                    if !handle(&page, &event, &script, &sink, &mut forwarded) {
                        return forwarded;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Recorder fell behind page events; occurrences lost");
                }
                Err(RecvError::Closed) => {
                    debug!("Page events ended");
                    return forwarded;
                }
            },
            _ = &mut stop_rx => break,
        }
    }

    loop {
        match events.try_recv() {
            Ok(event) => {
                if !handle(&page, &event, &script, &sink, &mut forwarded) {
                    break;
                }
            }
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Recorder fell behind page events; occurrences lost");
            }
            Err(_) => break,
        }
    }
    forwarded
}

/// Returns `false` once the payload sink is gone.
///
/// Re-evaluation in a new context runs on its own task so payloads queued
/// behind it keep flowing.
fn handle(
    page: &Arc<PageSession>,
    event: &CdpEvent,
    script: &Arc<str>,
    sink: &mpsc::UnboundedSender<String>,
    forwarded: &mut usize,
) -> bool {
    match event.method.as_str() {
        "Runtime.bindingCalled" => {
            if event.params["name"] != BRIDGE_BINDING {
                return true;
            }
            let Some(payload) = event.params["payload"].as_str() else {
                return true;
            };
            trace!(payload, "Bridge payload");
            if sink.send(payload.to_string()).is_err() {
                debug!("Capture pipeline closed; recorder forwarding ends");
                return false;
            }
            *forwarded += 1;
        }
        "Runtime.executionContextCreated" => {
            let context: ExecutionContextDescription =
                match serde_json::from_value(event.params["context"].clone()) {
                    Ok(context) => context,
                    Err(e) => {
                        debug!("Ignoring unreadable execution context: {}", e);
                        return true;
                    }
                };
            if !context.is_default() {
                return true;
            }
            let page = Arc::clone(page);
            let script = Arc::clone(script);
            tokio::spawn(async move {
                match page.evaluate_in_context(&script, context.id).await {
                    Ok(status) => trace!(context = context.id, status = %status, "Recorder evaluated"),
                    Err(e) => debug!(context = context.id, "Recorder not evaluated in context: {}", e),
                }
            });
        }
        _ => {}
    }
    true
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;

//! Main-frame load tracking from `Page.lifecycleEvent`.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{trace, warn};
use webflow_core::EngineError;

use crate::cdp::CdpEvent;

/// How far the main frame's current document has loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct LoadState {
    /// Loader of the current document; changes on every cross-document navigation.
    pub loader_id: Option<String>,
    pub dom_content_loaded: bool,
    pub network_idle: bool,
    /// The page or connection is gone.
    pub closed: bool,
}

impl LoadState {
    /// Fold one page event in. Returns whether the state changed.
    pub fn apply(&mut self, event: &CdpEvent, main_frame: &str) -> bool {
        match event.method.as_str() {
            "Page.lifecycleEvent" => {
                let params = &event.params;
                if params["frameId"].as_str() != Some(main_frame) {
                    return false;
                }
                let name = params["name"].as_str().unwrap_or_default();
                let loader = params["loaderId"].as_str().map(str::to_string);

                let before = self.clone();
                if name == "init" || (loader.is_some() && loader != self.loader_id) {
                    self.loader_id = loader;
                    self.dom_content_loaded = false;
                    self.network_idle = false;
                }
                match name {
                    "DOMContentLoaded" => self.dom_content_loaded = true,
                    "networkIdle" => self.network_idle = true,
                    _ => {}
                }
                *self != before
            }
            "Inspector.detached" => {
                self.closed = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_loader(&self, loader_id: &str) -> bool {
        self.loader_id.as_deref() == Some(loader_id)
    }
}

/// Background task folding page events into a [`LoadState`].
pub(super) struct LifecycleWatch {
    state: watch::Receiver<LoadState>,
    task: JoinHandle<()>,
}

impl LifecycleWatch {
    pub fn spawn(mut events: broadcast::Receiver<CdpEvent>, main_frame: String) -> Self {
        let (tx, rx) = watch::channel(LoadState::default());
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if tx.send_if_modified(|state| state.apply(&event, &main_frame)) {
                            trace!(state = ?*tx.borrow(), "Main frame lifecycle");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Lifecycle watcher fell behind page events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tx.send_modify(|state| state.closed = true);
        });

        Self { state: rx, task }
    }

    pub fn current(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Wait up to `timeout` for `reached`. `Ok(false)` on timeout.
    pub async fn wait<F>(&self, timeout: Duration, reached: F) -> Result<bool, EngineError>
    where
        F: Fn(&LoadState) -> bool,
    {
        let mut rx = self.state.clone();
        let outcome = tokio::time::timeout(timeout, rx.wait_for(|s| s.closed || reached(s))).await;
        match outcome {
            Err(_) => Ok(false),
            Ok(Ok(state)) if !state.closed => Ok(true),
            Ok(_) => Err(EngineError::Disconnected("page closed".to_string())),
        }
    }
}

impl Drop for LifecycleWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

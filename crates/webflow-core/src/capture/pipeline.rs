//! The capture pipeline.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::bus::CaptureBus;
use super::occurrence::RawOccurrence;
use crate::error::CaptureError;
use crate::event::Event;
use crate::redaction::RedactionPolicy;
use crate::session::SessionWriter;

/// Turns raw occurrences into redacted events, appends them to the session
/// log and publishes them.
///
/// Events are written in the order they are accepted. Nothing reaches the
/// log or the bus before redaction.
pub struct CapturePipeline {
    // Held across the append so log order matches acceptance order.
    policy: Mutex<RedactionPolicy>,
    writer: SessionWriter,
    bus: Arc<CaptureBus>,
    echo_first: usize,
}

impl CapturePipeline {
    pub fn new(writer: SessionWriter, redact_identity: bool) -> Self {
        Self {
            policy: Mutex::new(RedactionPolicy::new(redact_identity)),
            writer,
            bus: Arc::new(CaptureBus::new()),
            echo_first: 0,
        }
    }

    /// Publish to a shared bus instead of a private one.
    pub fn with_bus(mut self, bus: Arc<CaptureBus>) -> Self {
        self.bus = bus;
        self
    }

    /// Log the first `n` accepted events at info level.
    pub fn with_echo(mut self, n: usize) -> Self {
        self.echo_first = n;
        self
    }

    pub fn bus(&self) -> &Arc<CaptureBus> {
        &self.bus
    }

    pub fn writer(&self) -> &SessionWriter {
        &self.writer
    }

    /// Accept one occurrence.
    pub async fn accept(&self, raw: RawOccurrence) -> Result<Event, CaptureError> {
        let mut policy = self.policy.lock().await;
        let event = raw.into_event(&policy)?;
        let event = policy.classify_and_redact(event);
        self.writer.append(&event).await?;
        drop(policy);

        let written = self.writer.count();
        if written <= self.echo_first {
            info!(n = written, "Captured {}", serde_json::to_string(&event)?);
        } else {
            debug!(n = written, kind = %event.kind(), "Captured event");
        }
        self.bus.publish(&event);
        Ok(event)
    }

    /// Accept one occurrence as sent over the page bridge.
    pub async fn accept_json(&self, payload: &str) -> Result<Event, CaptureError> {
        self.accept(RawOccurrence::from_json(payload)?).await
    }

    /// Consume bridge payloads until the stream ends or `cancel` fires, then
    /// close the log. Payloads already queued at cancellation are still
    /// written. Returns the number of events written.
    ///
    /// Bad payloads are logged and dropped; a failing log ends the run.
    pub async fn run(
        &self,
        mut payloads: mpsc::UnboundedReceiver<String>,
        cancel: CancellationToken,
    ) -> Result<usize, CaptureError> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Capture cancelled; draining queued payloads");
                    while let Ok(payload) = payloads.try_recv() {
                        self.handle(&payload).await?;
                    }
                    break;
                }
                payload = payloads.recv() => match payload {
                    Some(payload) => self.handle(&payload).await?,
                    None => break,
                },
            }
        }

        self.writer.close().await?;
        info!(events = self.writer.count(), path = ?self.writer.path(), "Capture finished");
        Ok(self.writer.count())
    }

    async fn handle(&self, payload: &str) -> Result<(), CaptureError> {
        match self.accept_json(payload).await {
            Ok(_) => Ok(()),
            Err(CaptureError::Payload(message)) => {
                warn!(%message, "Dropping unrecognized occurrence");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

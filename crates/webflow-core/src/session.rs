//! Session logs: one JSON event per line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Local, Utc};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::SessionError;
use crate::event::{Event, EventKind};
use crate::replay::Replayer;

/// Append-only writer for one recording.
///
/// Every line is flushed as it is written, so a crash loses at most the
/// event being written.
pub struct SessionWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
    count: AtomicUsize,
}

impl SessionWriter {
    /// Start a new `session-YYYYmmdd-HHMMSS.jsonl` in `dir`, creating `dir`.
    pub async fn create(dir: impl AsRef<Path>) -> Result<Self, SessionError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let name = format!("session-{}.jsonl", Local::now().format("%Y%m%d-%H%M%S"));
        Self::open(dir.join(name)).await
    }

    /// Append to `path`, creating it if needed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        debug!("Opened session log: {:?}", path);

        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
            count: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Events written so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Write one event as a line.
    pub async fn append(&self, event: &Event) -> Result<(), SessionError> {
        let json = serde_json::to_string(event)?;
        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or(SessionError::Closed)?;
        file.write_all(json.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Flush and close. Later appends fail with [`SessionError::Closed`].
    pub async fn close(&self) -> Result<(), SessionError> {
        if let Some(mut file) = self.file.lock().await.take() {
            file.flush().await?;
            file.sync_all().await?;
            debug!(events = self.count(), "Closed session log: {:?}", self.path);
        }
        Ok(())
    }

    pub async fn is_closed(&self) -> bool {
        self.file.lock().await.is_none()
    }
}

/// Reads a session log back.
pub struct SessionReader;

impl SessionReader {
    /// Load every event from `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Vec<Event>, SessionError> {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::parse(&content)
    }

    /// Parse log content. Blank lines are ignored; anything else must be an
    /// event.
    pub fn parse(content: &str) -> Result<Vec<Event>, SessionError> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| SessionError::Malformed {
                    line: i + 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

/// Overview of a session log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub total: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub start_url: Option<String>,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    pub probes: usize,
}

impl SessionSummary {
    pub fn from_events(events: &[Event]) -> Self {
        let mut by_kind: BTreeMap<String, usize> = EventKind::ALL
            .iter()
            .map(|k| (k.to_string(), 0))
            .collect();
        for event in events {
            *by_kind.entry(event.kind().to_string()).or_default() += 1;
        }

        Self {
            total: events.len(),
            by_kind,
            start_url: Replayer::start_url(events).map(str::to_string),
            first: events.iter().map(|e| e.t).min(),
            last: events.iter().map(|e| e.t).max(),
            probes: events.iter().filter(|e| e.is_probe()).count(),
        }
    }

    /// Wall-clock span between the first and last event.
    pub fn duration(&self) -> chrono::Duration {
        match (self.first, self.last) {
            (Some(first), Some(last)) => last - first,
            _ => chrono::Duration::zero(),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

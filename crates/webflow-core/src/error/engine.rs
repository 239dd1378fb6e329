//! Automation engine errors.

use thiserror::Error;

/// Errors reported by an [`AutomationEngine`](crate::AutomationEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No element matches {0}")]
    NotFound(String),

    #[error("Element is covered by another element: {0}")]
    Intercepted(String),

    #[error("Action failed: {0}")]
    Action(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Script error: {0}")]
    Script(String),

    /// The page or browser went away; nothing further can be driven.
    #[error("Engine disconnected: {0}")]
    Disconnected(String),
}

impl EngineError {
    /// Whether replay can keep going after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Disconnected(_))
    }
}

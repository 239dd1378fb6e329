//! Replay errors.

use thiserror::Error;

use super::{EngineError, SessionError};
use crate::classify::FieldKind;

/// No candidate locator produced a visible element.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No locator resolved after {attempted} candidate(s)")]
    NotFound { attempted: usize },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Why a single step was skipped. Never aborts a replay.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Action failed: {0}")]
    Action(String),

    #[error("Navigation did not complete: {0}")]
    NavigationTimeout(String),

    /// A masked value whose field could not be classified.
    #[error("Cannot tell which credential belongs in this field")]
    Ambiguous,

    #[error("No {0} credential configured")]
    MissingCredential(FieldKind),
}

/// Errors that end a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Session has no starting URL")]
    NoStartUrl,

    #[error("Initial navigation to {url} failed: {source}")]
    InitialNavigation {
        url: String,
        #[source]
        source: EngineError,
    },

    #[error("Engine failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid session: {0}")]
    Session(#[from] SessionError),
}

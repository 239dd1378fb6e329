//! Capture errors.

use thiserror::Error;

use super::SessionError;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The page sent something that is not a recognizable occurrence.
    #[error("Invalid occurrence payload: {0}")]
    Payload(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<serde_json::Error> for CaptureError {
    fn from(e: serde_json::Error) -> Self {
        CaptureError::Payload(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_is_payload_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CaptureError = err.into();
        assert!(matches!(err, CaptureError::Payload(_)));
    }

    #[test]
    fn test_session_error_is_transparent() {
        let err: CaptureError = SessionError::Closed.into();
        assert_eq!(err.to_string(), "Session log is closed");
    }
}

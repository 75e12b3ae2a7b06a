//! Error types for per-frame processing.
//!
//! Frame errors are recoverable: the offending frame is discarded, the
//! failure is logged, and the session stays active. Terminal conditions
//! (authentication failure, transport closure) are handled at their own
//! layers; see [`crate::auth::AuthError`] and the session loop.

use thiserror::Error;

/// Reasons an inbound frame is discarded without terminating the session.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The payload was not valid JSON, was not an object, or lacked a
    /// recognizable `type` field.
    #[error("malformed frame: {0}")]
    Parse(#[from] serde_json::Error),

    /// A `message` frame with empty or whitespace-only text.
    #[error("empty message text")]
    EmptyText,

    /// A `message` frame whose text exceeds the configured maximum.
    #[error("message text too long ({len} > {max} chars)")]
    TextTooLong { len: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_error_display() {
        assert_eq!(FrameError::EmptyText.to_string(), "empty message text");
        assert_eq!(
            FrameError::TextTooLong { len: 501, max: 500 }.to_string(),
            "message text too long (501 > 500 chars)"
        );
    }

    #[test]
    fn frame_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let frame_err = FrameError::from(err);
        assert!(frame_err.to_string().starts_with("malformed frame:"));
    }
}

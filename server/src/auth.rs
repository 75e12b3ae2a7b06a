//! Shared-secret authentication for incoming WebSocket connections.
//!
//! Clients present the secret as a `token` query parameter, consumed exactly
//! once when the connection is accepted. The comparison against the
//! configured secret is constant-time so the check does not leak how much of
//! a guessed token matched.

use subtle::ConstantTimeEq;
use thiserror::Error;

/// Minimum acceptable token length. Anything shorter is rejected before the
/// secret comparison runs.
pub const MIN_TOKEN_LENGTH: usize = 8;

/// WebSocket close code for authentication failures (policy violation).
pub const CLOSE_CODE_POLICY_VIOLATION: u16 = 1008;

/// Reasons an incoming connection fails the authentication gate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `token` query parameter was supplied (or it was empty).
    #[error("missing token")]
    MissingToken,

    /// The supplied token is too short or does not match the secret.
    #[error("invalid token")]
    InvalidToken,
}

impl AuthError {
    /// Human-readable reason sent in the close frame.
    #[must_use]
    pub fn close_reason(&self) -> &'static str {
        match self {
            Self::MissingToken => "Missing token",
            Self::InvalidToken => "Invalid token",
        }
    }
}

/// Validates a client-supplied token against the configured secret.
///
/// # Errors
///
/// Returns [`AuthError::MissingToken`] when no token (or an empty token) was
/// supplied, and [`AuthError::InvalidToken`] when the token is shorter than
/// [`MIN_TOKEN_LENGTH`] or does not match the secret.
pub fn authenticate(token: Option<&str>, secret: &str) -> Result<(), AuthError> {
    let token = match token {
        Some(token) if !token.is_empty() => token,
        _ => return Err(AuthError::MissingToken),
    };

    if token.len() < MIN_TOKEN_LENGTH {
        return Err(AuthError::InvalidToken);
    }

    // subtle's slice comparison rejects length mismatches without comparing
    // contents, and compares equal-length inputs in constant time.
    if bool::from(token.as_bytes().ct_eq(secret.as_bytes())) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "correct-horse-battery";

    #[test]
    fn authenticate_accepts_matching_token() {
        assert!(authenticate(Some(SECRET), SECRET).is_ok());
    }

    #[test]
    fn authenticate_rejects_missing_token() {
        assert_eq!(authenticate(None, SECRET), Err(AuthError::MissingToken));
    }

    #[test]
    fn authenticate_rejects_empty_token() {
        assert_eq!(authenticate(Some(""), SECRET), Err(AuthError::MissingToken));
    }

    #[test]
    fn authenticate_rejects_short_token() {
        // Five characters, below the eight-character minimum.
        assert_eq!(
            authenticate(Some("abcde"), SECRET),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn authenticate_rejects_wrong_token_of_equal_length() {
        let wrong = "correct-horse-battery"
            .replace('y', "z");
        assert_eq!(wrong.len(), SECRET.len());
        assert_eq!(
            authenticate(Some(&wrong), SECRET),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn authenticate_rejects_prefix_of_secret() {
        assert_eq!(
            authenticate(Some("correct-horse"), SECRET),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn authenticate_rejects_secret_with_suffix() {
        assert_eq!(
            authenticate(Some("correct-horse-battery-staple"), SECRET),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn close_reasons_match_protocol_strings() {
        assert_eq!(AuthError::MissingToken.close_reason(), "Missing token");
        assert_eq!(AuthError::InvalidToken.close_reason(), "Invalid token");
    }
}

//! Session errors

use thiserror::Error;

/// Errors surfaced by the session manager.
///
/// Anything that merely means "this caller is not authenticated" is not an
/// error: it shows up as an absent session and a [`Rejection`] in the logs.
/// What remains here is a deployment defect and must not be swallowed.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Empty signing key, misbehaving identity provider, and the like
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Claims could not be serialized while issuing a token
    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

impl SessionError {
    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Token(_) => "TOKEN_ERROR",
        }
    }
}

impl From<crate::HmacKeyError> for SessionError {
    fn from(err: crate::HmacKeyError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Token parsing errors
#[derive(Error, Debug)]
pub enum TokenError {
    /// Structurally invalid token
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    /// A segment is not valid base64url
    #[error("invalid base64 segment: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Header or payload is not the expected JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Claim validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("token not valid before {not_before} (now {now})")]
    NotYetValid { not_before: i64, now: i64 },

    #[error("token expired at {expires_at} (now {now})")]
    Expired { expires_at: i64, now: i64 },

    #[error("issuer mismatch: expected {expected}, got {actual:?}")]
    IssuerMismatch {
        expected: String,
        actual: Option<String>,
    },

    #[error("audience mismatch: expected {expected}, got {actual:?}")]
    AudienceMismatch {
        expected: String,
        actual: Option<String>,
    },
}

/// Errors an [`crate::IdentityProvider`] may report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The provider produced something that does not honour the identity
    /// contract. Always fatal.
    #[error("identity contract violated: {0}")]
    Contract(String),

    /// Lookup failed (store unavailable, timeout, ...)
    #[error("identity lookup failed: {0}")]
    Backend(String),
}

/// Why a presented token did not yield a session.
///
/// Only used for logging; every variant means "unauthenticated".
#[derive(Error, Debug)]
pub enum Rejection {
    #[error("{0}")]
    Malformed(#[from] TokenError),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid claims: {0}")]
    InvalidClaims(#[from] ClaimsError),

    #[error("identity not found")]
    IdentityNotFound,

    #[error("auth key mismatch")]
    AuthKeyMismatch,

    /// An `authKey` claim reached a verifier that does not bind auth keys
    #[error("token bound to an auth key under a different strategy")]
    UnexpectedAuthKey,

    #[error("identity lookup failed: {0}")]
    IdentityLookupFailed(String),
}

impl Rejection {
    /// Stable code for logs and tooling
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "MALFORMED_TOKEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidClaims(_) => "INVALID_CLAIMS",
            Self::IdentityNotFound => "IDENTITY_NOT_FOUND",
            Self::AuthKeyMismatch => "AUTH_KEY_MISMATCH",
            Self::UnexpectedAuthKey => "UNEXPECTED_AUTH_KEY",
            Self::IdentityLookupFailed(_) => "IDENTITY_LOOKUP_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_key_error_is_configuration() {
        let err: SessionError = crate::HmacKeyError::Empty.into();
        assert!(matches!(err, SessionError::Configuration(_)));
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection::from(ClaimsError::Expired {
            expires_at: 10,
            now: 20,
        });
        assert_eq!(rejection.code(), "INVALID_CLAIMS");
        assert_eq!(
            rejection.to_string(),
            "invalid claims: token expired at 10 (now 20)"
        );
    }
}

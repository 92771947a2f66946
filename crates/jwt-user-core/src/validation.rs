//! Claim validation
//!
//! Time window and identity checks for a decoded claim set. Expected issuer
//! and audience arrive already resolved; how they were computed is the
//! caller's business.

use jwt_user_types::ClaimSet;

use crate::ClaimsError;

/// Validates claims against an instant and optional expected values.
///
/// All checks are independent and all must pass:
/// - `nbf`, if present, must be `<= now`
/// - `exp`, if present, must be `> now`
/// - `iss` must equal the expected issuer, when one is configured
/// - `aud` must equal the expected audience, when one is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimValidator {
    now: i64,
    issuer: Option<String>,
    audience: Option<String>,
}

impl ClaimValidator {
    /// Validator for the given instant (seconds since the Unix epoch)
    pub fn new(now: i64) -> Self {
        Self {
            now,
            issuer: None,
            audience: None,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience;
        self
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    /// Run every check, reporting the first failure
    pub fn check(&self, claims: &ClaimSet) -> Result<(), ClaimsError> {
        if let Some(not_before) = claims.not_before() {
            if not_before > self.now {
                return Err(ClaimsError::NotYetValid {
                    not_before,
                    now: self.now,
                });
            }
        }

        if let Some(expires_at) = claims.expires_at() {
            if expires_at <= self.now {
                return Err(ClaimsError::Expired {
                    expires_at,
                    now: self.now,
                });
            }
        }

        if let Some(expected) = &self.issuer {
            if claims.issuer() != Some(expected.as_str()) {
                return Err(ClaimsError::IssuerMismatch {
                    expected: expected.clone(),
                    actual: claims.issuer().map(str::to_string),
                });
            }
        }

        if let Some(expected) = &self.audience {
            if claims.audience() != Some(expected.as_str()) {
                return Err(ClaimsError::AudienceMismatch {
                    expected: expected.clone(),
                    actual: claims.audience().map(str::to_string),
                });
            }
        }

        Ok(())
    }

    pub fn is_valid(&self, claims: &ClaimSet) -> bool {
        self.check(claims).is_ok()
    }
}

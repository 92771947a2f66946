//! Token claim set

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Issued-at instant (informational).
pub const ISSUED_AT: &str = "iat";
/// Not-before instant.
pub const NOT_BEFORE: &str = "nbf";
/// Expiry instant. Absent means the token never expires.
pub const EXPIRATION: &str = "exp";
/// Subject identifier resolved by the identity provider.
pub const ID: &str = "jti";
/// Issuer.
pub const ISSUER: &str = "iss";
/// Audience.
pub const AUDIENCE: &str = "aud";
/// Per-identity secret fragment, present only when auth keys travel as a claim.
pub const AUTH_KEY: &str = "authKey";

/// Claims whose value must be integer seconds when present.
pub const TIME_CLAIMS: [&str; 3] = [ISSUED_AT, NOT_BEFORE, EXPIRATION];

/// Decoded token payload.
///
/// Keys are kept sorted so that serialization is deterministic: the same
/// claims always produce the same payload bytes and therefore the same
/// signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(BTreeMap<String, Value>);

impl ClaimSet {
    /// Create an empty claim set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a claim, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Builder form of [`ClaimSet::set`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Remove a claim, returning its previous value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Raw claim value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether the claim is present
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterate claims in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.get(ISSUED_AT).and_then(Value::as_i64)
    }

    pub fn not_before(&self) -> Option<i64> {
        self.get(NOT_BEFORE).and_then(Value::as_i64)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.get(EXPIRATION).and_then(Value::as_i64)
    }

    /// Subject identifier (`jti`)
    pub fn id(&self) -> Option<&str> {
        self.get(ID).and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get(ISSUER).and_then(Value::as_str)
    }

    pub fn audience(&self) -> Option<&str> {
        self.get(AUDIENCE).and_then(Value::as_str)
    }

    pub fn auth_key(&self) -> Option<&str> {
        self.get(AUTH_KEY).and_then(Value::as_str)
    }

    /// Validity window `exp - nbf` in seconds, `None` when the token never expires.
    ///
    /// Falls back to `iat` when `nbf` is missing. Never negative.
    pub fn lifetime(&self) -> Option<i64> {
        let exp = self.expires_at()?;
        let start = self.not_before().or_else(|| self.issued_at()).unwrap_or(exp);
        Some(exp.saturating_sub(start).max(0))
    }

    /// Session length in seconds, 0 for a browser-session token
    pub fn duration(&self) -> u64 {
        self.lifetime()
            .and_then(|secs| u64::try_from(secs).ok())
            .unwrap_or(0)
    }

    /// Consume into the underlying map
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<BTreeMap<String, Value>> for ClaimSet {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for ClaimSet {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reserved_accessors() {
        let claims = ClaimSet::new()
            .with(ISSUED_AT, 1000)
            .with(NOT_BEFORE, 1000)
            .with(EXPIRATION, 4600)
            .with(ID, "jti_foo")
            .with(AUTH_KEY, "foo");

        assert_eq!(claims.issued_at(), Some(1000));
        assert_eq!(claims.not_before(), Some(1000));
        assert_eq!(claims.expires_at(), Some(4600));
        assert_eq!(claims.id(), Some("jti_foo"));
        assert_eq!(claims.auth_key(), Some("foo"));
        assert_eq!(claims.issuer(), None);
        assert_eq!(claims.duration(), 3600);
    }

    #[test]
    fn test_duration_without_expiry_is_zero() {
        let claims = ClaimSet::new().with(NOT_BEFORE, 1000).with(ID, "a");
        assert_eq!(claims.duration(), 0);
    }

    #[test]
    fn test_duration_never_negative() {
        let claims = ClaimSet::new().with(NOT_BEFORE, 5000).with(EXPIRATION, 1000);
        assert_eq!(claims.duration(), 0);
    }

    #[test]
    fn test_duration_falls_back_to_issued_at() {
        let claims = ClaimSet::new().with(ISSUED_AT, 100).with(EXPIRATION, 160);
        assert_eq!(claims.duration(), 60);
    }

    #[test]
    fn test_serializes_in_key_order() {
        let claims = ClaimSet::new()
            .with("zeta", 1)
            .with(ID, "x")
            .with(AUDIENCE, "https://example.com");
        let json = serde_json::to_string(&claims).unwrap();
        assert_eq!(json, r#"{"aud":"https://example.com","jti":"x","zeta":1}"#);
    }

    #[test]
    fn test_non_integer_time_claim_reads_as_absent() {
        let claims = ClaimSet::new().with(EXPIRATION, json!("soon"));
        assert!(claims.has(EXPIRATION));
        assert_eq!(claims.expires_at(), None);
    }
}

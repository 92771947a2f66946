//! Identity provider interface
//!
//! The session core never owns identities. It asks the host's provider to
//! resolve the `jti` claim and reads the identity's current auth key.

use async_trait::async_trait;

use crate::crypto::constant_time_str_eq;
use crate::IdentityError;

/// Capabilities the session core requires from a resolved identity
pub trait Identity: Send + Sync {
    /// Identifier stored in the `jti` claim
    fn id(&self) -> &str;

    /// Current per-identity secret.
    ///
    /// Rotating it invalidates every token bound to the previous value.
    fn auth_key(&self) -> &str;
}

/// Resolves identities by id.
///
/// This is the only call in a session operation that may suspend; the core
/// adds no timeout or retry of its own.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    type Identity: Identity;

    /// Find an identity by id.
    ///
    /// Returns `Ok(None)` when no such identity exists. Return
    /// [`IdentityError::Contract`] when the backing store yields something
    /// that cannot act as an identity; the session core treats that as a
    /// deployment defect and propagates it.
    async fn find_identity(&self, id: &str) -> Result<Option<Self::Identity>, IdentityError>;

    /// Check a candidate auth key against the identity's current one
    fn validate_auth_key(&self, identity: &Self::Identity, candidate: &str) -> bool {
        constant_time_str_eq(identity.auth_key(), candidate)
    }
}

/// Minimal owned identity, handy for providers backed by a simple store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity {
    pub id: String,
    pub auth_key: String,
}

impl StaticIdentity {
    pub fn new(id: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            auth_key: auth_key.into(),
        }
    }
}

impl Identity for StaticIdentity {
    fn id(&self) -> &str {
        &self.id
    }

    fn auth_key(&self) -> &str {
        &self.auth_key
    }
}

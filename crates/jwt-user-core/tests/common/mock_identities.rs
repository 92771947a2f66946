//! In-memory identity provider for testing

#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use jwt_user_core::{
    FixedClock, IdentityError, IdentityProvider, KeyBinding, RequestContext, SessionConfig,
    SessionManager, StaticIdentity,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Signing key shared by most tests
pub const SIGNING_KEY: &str = "foobar";

/// Issuance instant used throughout
pub const T0: i64 = 1000;

/// In-memory identity provider.
///
/// Special ids:
/// - `error` violates the identity contract
/// - `backend` fails the lookup
/// - `imposter` resolves to a different identity
#[derive(Default, Clone)]
pub struct MockIdentityProvider {
    identities: Arc<DashMap<String, StaticIdentity>>,
    lookups: Arc<AtomicUsize>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider knowing `jti_foo` with auth key `foo`
    pub fn with_default_identity() -> Self {
        let provider = Self::new();
        provider.insert("jti_foo", "foo");
        provider
    }

    pub fn insert(&self, id: &str, auth_key: &str) -> StaticIdentity {
        let identity = StaticIdentity::new(id, auth_key);
        self.identities.insert(id.to_string(), identity.clone());
        identity
    }

    /// Replace an identity's auth key, invalidating tokens bound to the old one
    pub fn rotate_auth_key(&self, id: &str, auth_key: &str) {
        if let Some(mut identity) = self.identities.get_mut(id) {
            identity.auth_key = auth_key.to_string();
        }
    }

    pub fn delete(&self, id: &str) {
        self.identities.remove(id);
    }

    pub fn get(&self, id: &str) -> Option<StaticIdentity> {
        self.identities.get(id).map(|r| r.value().clone())
    }

    /// Number of `find_identity` calls so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    type Identity = StaticIdentity;

    async fn find_identity(&self, id: &str) -> Result<Option<StaticIdentity>, IdentityError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match id {
            "error" => Err(IdentityError::Contract(
                "stored record has no auth key accessor".to_string(),
            )),
            "backend" => Err(IdentityError::Backend("connection refused".to_string())),
            "imposter" => Ok(Some(StaticIdentity::new("someone-else", "x"))),
            _ => Ok(self.get(id)),
        }
    }
}

/// Session manager over `provider` with a fixed clock at [`T0`]
pub fn manager(
    config: SessionConfig,
    provider: &MockIdentityProvider,
) -> (SessionManager<MockIdentityProvider>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(T0));
    let manager = SessionManager::new(config, Arc::new(provider.clone()))
        .expect("valid test config")
        .with_clock(clock.clone());
    (manager, clock)
}

/// Request context for `https://example.com` from `127.0.0.1`
pub fn context() -> RequestContext {
    RequestContext::new()
        .with_host_info("https://example.com")
        .with_user_ip("127.0.0.1")
}

pub const ALL_BINDINGS: [KeyBinding; 3] =
    [KeyBinding::None, KeyBinding::Claim, KeyBinding::AppendToKey];

//! Interoperability with the `jsonwebtoken` crate
//!
//! Tokens minted here must be accepted by a standard HS256 validator and
//! standard HS256 tokens must be accepted here.

mod common;

use std::sync::Arc;

use common::{context, MockIdentityProvider};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use jwt_user_core::{
    ClaimSet, FixedClock, KeyBinding, MemoryCookieStore, SessionConfig, SessionManager,
};
use jwt_user_types::{AUDIENCE, AUTH_KEY, EXPIRATION, ID, ISSUED_AT, ISSUER, NOT_BEFORE};

const SECRET: &str = "a-reasonably-long-signing-secret!";
const ORIGIN: &str = "https://example.com";

fn now() -> i64 {
    jsonwebtoken::get_current_timestamp() as i64
}

fn session_manager(
    binding: KeyBinding,
    provider: &MockIdentityProvider,
) -> SessionManager<MockIdentityProvider> {
    let config = SessionConfig::new(SECRET).with_key_binding(binding);
    SessionManager::new(config, Arc::new(provider.clone()))
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(now())))
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ORIGIN]);
    validation.set_audience(&[ORIGIN]);
    validation.validate_nbf = true;
    validation
}

#[test]
fn test_issued_token_accepted_by_jsonwebtoken() {
    let provider = MockIdentityProvider::with_default_identity();
    let manager = session_manager(KeyBinding::Claim, &provider);
    let identity = provider.get("jti_foo").unwrap();
    let mut cookies = MemoryCookieStore::new();

    let token = manager.issue(&identity, 3600, &context(), &mut cookies).unwrap();

    let decoded = jsonwebtoken::decode::<ClaimSet>(
        &token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &validation(),
    )
    .expect("standard validator accepts the token");
    assert_eq!(decoded.header.alg, Algorithm::HS256);
    assert_eq!(decoded.claims.id(), Some("jti_foo"));
    assert_eq!(decoded.claims.auth_key(), Some("foo"));
    assert_eq!(decoded.claims.duration(), 3600);
}

#[test]
fn test_appended_key_token_needs_appended_secret() {
    let provider = MockIdentityProvider::with_default_identity();
    let manager = session_manager(KeyBinding::AppendToKey, &provider);
    let identity = provider.get("jti_foo").unwrap();
    let mut cookies = MemoryCookieStore::new();

    let token = manager.issue(&identity, 3600, &context(), &mut cookies).unwrap();

    let base = jsonwebtoken::decode::<ClaimSet>(
        &token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &validation(),
    );
    assert!(base.is_err());

    let appended = format!("{SECRET}foo");
    let decoded = jsonwebtoken::decode::<ClaimSet>(
        &token,
        &DecodingKey::from_secret(appended.as_bytes()),
        &validation(),
    );
    assert!(decoded.is_ok());
}

#[tokio::test]
async fn test_jsonwebtoken_token_accepted() {
    let provider = MockIdentityProvider::with_default_identity();
    let manager = session_manager(KeyBinding::Claim, &provider);
    let now = now();

    let claims = ClaimSet::new()
        .with(ISSUED_AT, now)
        .with(NOT_BEFORE, now)
        .with(EXPIRATION, now + 3600)
        .with(ID, "jti_foo")
        .with(AUTH_KEY, "foo")
        .with(ISSUER, ORIGIN)
        .with(AUDIENCE, ORIGIN);
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let mut cookies = MemoryCookieStore::with_value("identity", token);
    let session = manager
        .verify_and_login(&context(), &mut cookies)
        .await
        .unwrap()
        .expect("session from standard token");
    assert_eq!(session.identity.id, "jti_foo");
    assert_eq!(session.duration, 3600);
}

#[tokio::test]
async fn test_other_algorithm_rejected() {
    let provider = MockIdentityProvider::with_default_identity();
    let manager = session_manager(KeyBinding::None, &provider);
    let now = now();

    let claims = ClaimSet::new()
        .with(ISSUED_AT, now)
        .with(NOT_BEFORE, now)
        .with(EXPIRATION, now + 3600)
        .with(ID, "jti_foo");
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let mut cookies = MemoryCookieStore::with_value("identity", token);
    let session = manager.verify_and_login(&context(), &mut cookies).await.unwrap();
    assert!(session.is_none());
    assert!(cookies.is_empty());
}

//! Session management with signed JWT cookies
//!
//! Issues, verifies and renews the identity cookie. Nothing is stored
//! server side: the token is the session.

use std::sync::Arc;

use jwt_user_types::{
    ClaimSet, RequestContext, SessionDescriptor, AUDIENCE, AUTH_KEY, EXPIRATION, ID, ISSUED_AT,
    ISSUER, NOT_BEFORE,
};

use crate::clock::{Clock, SystemClock};
use crate::config::{SessionConfig, StaleAuthKeyPolicy};
use crate::cookie::CookieStore;
use crate::identity::{Identity, IdentityProvider};
use crate::key::{KeyBinding, KeyDeriver};
use crate::token;
use crate::validation::ClaimValidator;
use crate::{IdentityError, Rejection, SessionError, TokenError};

/// Outcome of checking a presented token
#[derive(Debug)]
pub enum Verification<I> {
    /// Signature, claims and identity all check out
    Verified { identity: I, claims: ClaimSet },
    /// The caller is unauthenticated
    Rejected(Rejection),
}

/// Session manager handles cookie issuance, login and renewal
pub struct SessionManager<P: IdentityProvider> {
    config: SessionConfig,
    keys: KeyDeriver,
    provider: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<P: IdentityProvider> SessionManager<P> {
    /// Create a new session manager
    ///
    /// # Errors
    /// [`SessionError::Configuration`] if the configuration is unusable,
    /// e.g. an empty signing key.
    pub fn new(config: SessionConfig, provider: Arc<P>) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            keys: KeyDeriver::new(config.signing_key.clone(), config.key_binding()),
            config,
            provider,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Issue a cookie for `identity` after primary authentication.
    ///
    /// `duration` is in seconds; 0 issues a browser-session cookie with no
    /// `exp` claim. Returns the token written to the cookie.
    pub fn issue<C>(
        &self,
        identity: &P::Identity,
        duration: u64,
        ctx: &RequestContext,
        cookies: &mut C,
    ) -> Result<String, SessionError>
    where
        C: CookieStore + ?Sized,
    {
        let now = self.clock.now();
        let mut claims = ClaimSet::new();
        claims
            .set(ISSUED_AT, now)
            .set(NOT_BEFORE, now)
            .set(ID, identity.id());
        if duration > 0 {
            let duration = i64::try_from(duration).unwrap_or(i64::MAX);
            claims.set(EXPIRATION, now.saturating_add(duration));
        }
        if let Some(issuer) = self.config.issuer.issued_value(ctx) {
            claims.set(ISSUER, issuer);
        }
        if let Some(audience) = self.config.audience.issued_value(ctx) {
            claims.set(AUDIENCE, audience);
        }
        if self.keys.binding().carries_auth_key_claim() {
            claims.set(AUTH_KEY, identity.auth_key());
        }

        self.send_token(&claims, identity, cookies)
    }

    /// Attempt a silent login from the stored cookie.
    ///
    /// Returns `Ok(None)` when there is no cookie or it does not yield a
    /// session; a rejected cookie is removed. Only configuration defects
    /// are errors.
    pub async fn verify_and_login<C>(
        &self,
        ctx: &RequestContext,
        cookies: &mut C,
    ) -> Result<Option<SessionDescriptor<P::Identity>>, SessionError>
    where
        C: CookieStore + ?Sized,
    {
        Ok(self
            .read_cookie(ctx, cookies)
            .await?
            .map(|(identity, claims)| SessionDescriptor::new(identity, claims.duration())))
    }

    /// Cookie login as the host's request pipeline runs it.
    ///
    /// Same as [`Self::verify_and_login`], and with `auto_renew` the
    /// cookie's validity window slides forward on success.
    pub async fn login_from_cookie<C>(
        &self,
        ctx: &RequestContext,
        cookies: &mut C,
    ) -> Result<Option<SessionDescriptor<P::Identity>>, SessionError>
    where
        C: CookieStore + ?Sized,
    {
        let Some((identity, claims)) = self.read_cookie(ctx, cookies).await? else {
            return Ok(None);
        };

        tracing::info!(
            id = identity.id(),
            client_ip = ctx.client_ip(),
            "Identity logged in via cookie"
        );

        let duration = claims.duration();
        if self.config.auto_renew {
            self.slide(claims, &identity, cookies)?;
        }
        Ok(Some(SessionDescriptor::new(identity, duration)))
    }

    /// Slide the stored cookie's validity window forward.
    ///
    /// Any verification failure is a silent no-op that leaves the cookie
    /// untouched, as is a cookie without `exp`. Returns the new token when
    /// one was written.
    pub async fn renew<C>(
        &self,
        ctx: &RequestContext,
        cookies: &mut C,
    ) -> Result<Option<String>, SessionError>
    where
        C: CookieStore + ?Sized,
    {
        let Some(raw) = cookies.get(&self.config.cookie.name) else {
            return Ok(None);
        };

        match self.verify_token(&raw, ctx).await? {
            Verification::Verified { identity, claims } => self.slide(claims, &identity, cookies),
            Verification::Rejected(Rejection::AuthKeyMismatch)
                if self.config.stale_auth_key_on_renew == StaleAuthKeyPolicy::Logout =>
            {
                tracing::warn!(
                    client_ip = ctx.client_ip(),
                    "Removing identity cookie bound to a rotated auth key"
                );
                cookies.remove(&self.config.cookie);
                Ok(None)
            }
            Verification::Rejected(reason) => {
                tracing::debug!(reason = %reason, "Skipping identity cookie renewal");
                Ok(None)
            }
        }
    }

    /// Remove the identity cookie
    pub fn logout<C>(&self, cookies: &mut C)
    where
        C: CookieStore + ?Sized,
    {
        cookies.remove(&self.config.cookie);
    }

    /// Decode a token without verifying it
    pub fn inspect(&self, raw: &str) -> Result<ClaimSet, TokenError> {
        token::decode(raw).map(token::Token::into_claims)
    }

    /// Verify a raw token: parse, check signature and claims, resolve the
    /// identity.
    ///
    /// With an appended auth key the identity is resolved first, since the
    /// verification key depends on it. Otherwise the signature is checked
    /// before any identity lookup happens.
    pub async fn verify_token(
        &self,
        raw: &str,
        ctx: &RequestContext,
    ) -> Result<Verification<P::Identity>, SessionError> {
        let token = match token::decode(raw) {
            Ok(token) => token,
            Err(e) => return Ok(Verification::Rejected(e.into())),
        };
        let id = token.id().to_string();
        let validator = self.claim_validator(ctx);

        let identity = if self.keys.binding().needs_identity_for_key() {
            let identity = match self.find_identity(&id).await? {
                Ok(identity) => identity,
                Err(rejection) => return Ok(Verification::Rejected(rejection)),
            };
            // Base key plus nothing: indistinguishable from an unbound token
            if identity.auth_key().is_empty() {
                tracing::warn!(id = %id, "Identity has no auth key to append");
                return Ok(Verification::Rejected(Rejection::AuthKeyMismatch));
            }
            if !token.verify(&self.keys.derive(Some(&identity))?) {
                return Ok(Verification::Rejected(Rejection::InvalidSignature));
            }
            if let Err(e) = validator.check(token.claims()) {
                return Ok(Verification::Rejected(e.into()));
            }
            if token.claims().has(AUTH_KEY) {
                return Ok(Verification::Rejected(Rejection::UnexpectedAuthKey));
            }
            identity
        } else {
            if !token.verify(&self.keys.derive(None::<&P::Identity>)?) {
                return Ok(Verification::Rejected(Rejection::InvalidSignature));
            }
            if let Err(e) = validator.check(token.claims()) {
                return Ok(Verification::Rejected(e.into()));
            }
            if self.keys.binding() == KeyBinding::None && token.claims().has(AUTH_KEY) {
                return Ok(Verification::Rejected(Rejection::UnexpectedAuthKey));
            }
            let identity = match self.find_identity(&id).await? {
                Ok(identity) => identity,
                Err(rejection) => return Ok(Verification::Rejected(rejection)),
            };
            if self.keys.binding() == KeyBinding::Claim {
                let Some(candidate) = token.claims().auth_key() else {
                    tracing::warn!(id = %id, "Token carries no auth key");
                    return Ok(Verification::Rejected(Rejection::AuthKeyMismatch));
                };
                if !self.provider.validate_auth_key(&identity, candidate) {
                    tracing::warn!(
                        id = %id,
                        attempted_length = candidate.len(),
                        "Invalid auth key attempted"
                    );
                    return Ok(Verification::Rejected(Rejection::AuthKeyMismatch));
                }
            }
            identity
        };

        Ok(Verification::Verified {
            identity,
            claims: token.into_claims(),
        })
    }

    /// Login read path: a rejected cookie is logged and removed
    async fn read_cookie<C>(
        &self,
        ctx: &RequestContext,
        cookies: &mut C,
    ) -> Result<Option<(P::Identity, ClaimSet)>, SessionError>
    where
        C: CookieStore + ?Sized,
    {
        let Some(raw) = cookies.get(&self.config.cookie.name) else {
            tracing::debug!("No identity cookie present");
            return Ok(None);
        };

        match self.verify_token(&raw, ctx).await? {
            Verification::Verified { identity, claims } => Ok(Some((identity, claims))),
            Verification::Rejected(reason) => {
                tracing::warn!(
                    client_ip = ctx.client_ip(),
                    code = reason.code(),
                    "Invalid JWT cookie from {}: {}",
                    ctx.client_ip(),
                    reason
                );
                cookies.remove(&self.config.cookie);
                Ok(None)
            }
        }
    }

    /// Re-sign verified claims with a window starting now and the same length
    fn slide<C>(
        &self,
        mut claims: ClaimSet,
        identity: &P::Identity,
        cookies: &mut C,
    ) -> Result<Option<String>, SessionError>
    where
        C: CookieStore + ?Sized,
    {
        let Some(lifetime) = claims.lifetime() else {
            return Ok(None);
        };
        let now = self.clock.now();
        claims
            .set(NOT_BEFORE, now)
            .set(EXPIRATION, now.saturating_add(lifetime));

        self.send_token(&claims, identity, cookies).map(Some)
    }

    fn send_token<C>(
        &self,
        claims: &ClaimSet,
        identity: &P::Identity,
        cookies: &mut C,
    ) -> Result<String, SessionError>
    where
        C: CookieStore + ?Sized,
    {
        let key = self.keys.derive(Some(identity))?;
        let value = token::encode(claims, &key)?;
        let expire = claims.expires_at().unwrap_or(0);
        cookies.set(self.config.cookie.to_cookie(value.clone(), expire));
        Ok(value)
    }

    /// Resolve `id`, mapping provider failures onto the error taxonomy
    async fn find_identity(&self, id: &str) -> Result<Result<P::Identity, Rejection>, SessionError> {
        match self.provider.find_identity(id).await {
            Ok(Some(identity)) if identity.id() == id => Ok(Ok(identity)),
            Ok(Some(identity)) => {
                tracing::error!(
                    requested = id,
                    returned = identity.id(),
                    "Identity provider returned a different identity"
                );
                Err(SessionError::Configuration(format!(
                    "find_identity({id}) returned identity '{}'",
                    identity.id()
                )))
            }
            Ok(None) => Ok(Err(Rejection::IdentityNotFound)),
            Err(IdentityError::Contract(msg)) => {
                tracing::error!(id, "Identity provider contract violated: {}", msg);
                Err(SessionError::Configuration(format!(
                    "identity provider must return a valid identity: {msg}"
                )))
            }
            Err(IdentityError::Backend(msg)) => Ok(Err(Rejection::IdentityLookupFailed(msg))),
        }
    }

    fn claim_validator(&self, ctx: &RequestContext) -> ClaimValidator {
        ClaimValidator::new(self.clock.now())
            .with_issuer(self.config.issuer.expected_value(ctx))
            .with_audience(self.config.audience.expected_value(ctx))
    }
}

impl<P: IdentityProvider> Clone for SessionManager<P> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            keys: self.keys.clone(),
            provider: Arc::clone(&self.provider),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<P: IdentityProvider> std::fmt::Debug for SessionManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

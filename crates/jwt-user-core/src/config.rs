//! Configuration types for cookie sessions

use std::sync::Arc;

use jwt_user_types::RequestContext;

use crate::cookie::CookieOptions;
use crate::crypto::HmacKey;
use crate::key::KeyBinding;
use crate::SessionError;

/// Where an issuer or audience value comes from
#[derive(Clone, Default)]
pub enum ClaimSource {
    /// The current request's origin (`RequestContext::host_info`) when
    /// issuing; not checked when verifying.
    #[default]
    RequestOrigin,
    /// Fixed value, issued and enforced
    Fixed(String),
    /// Computed per request, issued and enforced
    Dynamic(Arc<dyn Fn(&RequestContext) -> Option<String> + Send + Sync>),
}

impl ClaimSource {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> Option<String> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Value to put in a freshly issued token
    pub fn issued_value(&self, ctx: &RequestContext) -> Option<String> {
        match self {
            Self::RequestOrigin => ctx.host_info.clone(),
            Self::Fixed(value) => Some(value.clone()),
            Self::Dynamic(f) => f(ctx),
        }
    }

    /// Value a presented token must carry, `None` when unchecked
    pub fn expected_value(&self, ctx: &RequestContext) -> Option<String> {
        match self {
            Self::RequestOrigin => None,
            Self::Fixed(value) => Some(value.clone()),
            Self::Dynamic(f) => f(ctx),
        }
    }
}

impl std::fmt::Debug for ClaimSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestOrigin => f.write_str("RequestOrigin"),
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for ClaimSource {
    fn from(value: &str) -> Self {
        Self::Fixed(value.to_string())
    }
}

impl From<String> for ClaimSource {
    fn from(value: String) -> Self {
        Self::Fixed(value)
    }
}

/// What renewal does when the `authKey` claim no longer matches the
/// identity's current auth key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleAuthKeyPolicy {
    /// Leave the cookie untouched; the next cookie login rejects it
    #[default]
    SilentDeny,
    /// Remove the cookie immediately
    Logout,
}

/// Immutable session configuration, built once at startup
#[derive(Clone)]
pub struct SessionConfig {
    /// HMAC signing key. Must be random, secret and non-empty.
    pub signing_key: String,
    /// Bind tokens to the identity's auth key
    pub use_auth_key: bool,
    /// Append the auth key to the signing key instead of carrying it as a claim
    pub append_auth_key: bool,
    /// `iss` claim
    pub issuer: ClaimSource,
    /// `aud` claim
    pub audience: ClaimSource,
    /// Identity cookie attributes
    pub cookie: CookieOptions,
    /// Slide the cookie's validity window on every cookie login
    pub auto_renew: bool,
    /// Renewal behaviour after an auth key rotation
    pub stale_auth_key_on_renew: StaleAuthKeyPolicy,
}

impl SessionConfig {
    /// Create a config with defaults: auth key bound as a claim, issuer and
    /// audience taken from the request origin, auto-renew on.
    pub fn new(signing_key: impl Into<String>) -> Self {
        Self {
            signing_key: signing_key.into(),
            use_auth_key: true,
            append_auth_key: false,
            issuer: ClaimSource::default(),
            audience: ClaimSource::default(),
            cookie: CookieOptions::default(),
            auto_renew: true,
            stale_auth_key_on_renew: StaleAuthKeyPolicy::default(),
        }
    }

    pub fn with_use_auth_key(mut self, use_auth_key: bool) -> Self {
        self.use_auth_key = use_auth_key;
        self
    }

    pub fn with_append_auth_key(mut self, append_auth_key: bool) -> Self {
        self.append_auth_key = append_auth_key;
        self
    }

    /// Set both auth key flags from a binding strategy
    pub fn with_key_binding(self, binding: KeyBinding) -> Self {
        match binding {
            KeyBinding::None => self.with_use_auth_key(false).with_append_auth_key(false),
            KeyBinding::Claim => self.with_use_auth_key(true).with_append_auth_key(false),
            KeyBinding::AppendToKey => self.with_use_auth_key(true).with_append_auth_key(true),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<ClaimSource>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<ClaimSource>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_cookie(mut self, cookie: CookieOptions) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_auto_renew(mut self, auto_renew: bool) -> Self {
        self.auto_renew = auto_renew;
        self
    }

    pub fn with_stale_auth_key_policy(mut self, policy: StaleAuthKeyPolicy) -> Self {
        self.stale_auth_key_on_renew = policy;
        self
    }

    /// Active identity-binding strategy
    pub fn key_binding(&self) -> KeyBinding {
        KeyBinding::from_flags(self.use_auth_key, self.append_auth_key)
    }

    /// Check invariants that must hold before any token is issued.
    ///
    /// # Errors
    /// [`SessionError::Configuration`] for an empty signing key or cookie name.
    pub fn validate(&self) -> Result<(), SessionError> {
        HmacKey::new(self.signing_key.as_bytes())?;
        if self.cookie.name.is_empty() {
            return Err(SessionError::Configuration(
                "identity cookie name cannot be empty".to_string(),
            ));
        }
        if self.signing_key.len() < HmacKey::RECOMMENDED_KEY_LENGTH {
            tracing::warn!(
                key_length = self.signing_key.len(),
                "Signing key is shorter than {} bytes",
                HmacKey::RECOMMENDED_KEY_LENGTH
            );
        }
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signing_key =
            lookup("JWT_USER_SIGNING_KEY").ok_or(ConfigError::Missing("JWT_USER_SIGNING_KEY"))?;
        if signing_key.is_empty() {
            return Err(ConfigError::Invalid("JWT_USER_SIGNING_KEY"));
        }

        let parse_bool = |name: &'static str, default: bool| -> Result<bool, ConfigError> {
            match lookup(name) {
                Some(value) => value.parse().map_err(|_| ConfigError::Invalid(name)),
                None => Ok(default),
            }
        };

        let mut config = Self::new(signing_key)
            .with_use_auth_key(parse_bool("JWT_USER_USE_AUTH_KEY", true)?)
            .with_append_auth_key(parse_bool("JWT_USER_APPEND_AUTH_KEY", false)?)
            .with_auto_renew(parse_bool("JWT_USER_AUTO_RENEW", true)?);

        if let Some(issuer) = lookup("JWT_USER_ISSUER") {
            config = config.with_issuer(issuer);
        }
        if let Some(audience) = lookup("JWT_USER_AUDIENCE") {
            config = config.with_audience(audience);
        }
        if let Some(name) = lookup("JWT_USER_COOKIE_NAME") {
            config.cookie.name = name;
        }
        config.cookie.secure = parse_bool("JWT_USER_COOKIE_SECURE", true)?;

        Ok(config)
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("signing_key_length", &self.signing_key.len())
            .field("use_auth_key", &self.use_auth_key)
            .field("append_auth_key", &self.append_auth_key)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("cookie", &self.cookie)
            .field("auto_renew", &self.auto_renew)
            .field("stale_auth_key_on_renew", &self.stale_auth_key_on_renew)
            .finish()
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

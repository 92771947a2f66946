//! Signing key derivation
//!
//! How a token is bound to its identity's auth key decides both the key
//! material and whether an `authKey` claim travels in the payload.

use crate::crypto::HmacKey;
use crate::identity::Identity;
use crate::SessionError;

/// Identity-binding strategy for session tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyBinding {
    /// Base secret only. Tokens survive auth key rotation.
    None,
    /// Base secret; the identity's auth key travels as the `authKey` claim
    /// and is compared on verification.
    #[default]
    Claim,
    /// Base secret followed by the identity's auth key. The identity must be
    /// resolved before a signature can be checked.
    AppendToKey,
}

impl KeyBinding {
    /// Map the `useAuthKey` / `appendAuthKey` configuration flags
    pub fn from_flags(use_auth_key: bool, append_auth_key: bool) -> Self {
        match (use_auth_key, append_auth_key) {
            (false, _) => Self::None,
            (true, false) => Self::Claim,
            (true, true) => Self::AppendToKey,
        }
    }

    /// Whether verification needs the identity before the signature check
    pub fn needs_identity_for_key(self) -> bool {
        self == Self::AppendToKey
    }

    /// Whether tokens carry an `authKey` claim
    pub fn carries_auth_key_claim(self) -> bool {
        self == Self::Claim
    }
}

/// Computes the HMAC key for a signing or verification operation
#[derive(Clone)]
pub struct KeyDeriver {
    signing_key: String,
    binding: KeyBinding,
}

impl KeyDeriver {
    pub fn new(signing_key: impl Into<String>, binding: KeyBinding) -> Self {
        Self {
            signing_key: signing_key.into(),
            binding,
        }
    }

    pub fn binding(&self) -> KeyBinding {
        self.binding
    }

    /// Derive the key for `identity`.
    ///
    /// With [`KeyBinding::AppendToKey`] the identity is mandatory: callers
    /// must resolve it first.
    ///
    /// # Errors
    /// [`SessionError::Configuration`] when the resulting key is empty, or
    /// when the appended binding gets no identity or an empty auth key.
    pub fn derive<I>(&self, identity: Option<&I>) -> Result<HmacKey, SessionError>
    where
        I: Identity + ?Sized,
    {
        if self.binding.needs_identity_for_key() {
            let identity = identity.ok_or_else(|| {
                SessionError::Configuration(
                    "appended auth key binding needs a resolved identity".to_string(),
                )
            })?;
            if identity.auth_key().is_empty() {
                return Err(SessionError::Configuration(
                    "appended auth key binding needs a non-empty auth key".to_string(),
                ));
            }
            let mut material = Vec::with_capacity(self.signing_key.len() + identity.auth_key().len());
            material.extend_from_slice(self.signing_key.as_bytes());
            material.extend_from_slice(identity.auth_key().as_bytes());
            return Ok(HmacKey::new(material)?);
        }

        Ok(HmacKey::new(self.signing_key.as_bytes())?)
    }
}

impl std::fmt::Debug for KeyDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyDeriver")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

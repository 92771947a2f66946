//! Compact JWT codec (HS256)
//!
//! Tokens are three base64url segments joined by `.`: header, payload and
//! the HMAC-SHA256 of `header.payload`. Decoding never checks the
//! signature; that is a separate step because the verification key may
//! depend on who the token claims to be.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jwt_user_types::{ClaimSet, TIME_CLAIMS};
use serde::{Deserialize, Serialize};

use crate::crypto::HmacKey;
use crate::TokenError;

/// The only signing algorithm this codec produces or accepts
pub const ALGORITHM: &str = "HS256";

const TOKEN_TYPE: &str = "JWT";

/// JOSE header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        }
    }
}

/// A parsed, not yet verified token
#[derive(Debug, Clone)]
pub struct Token {
    header: Header,
    claims: ClaimSet,
    /// `header_b64.payload_b64` exactly as received
    signing_input: String,
    signature: Vec<u8>,
    /// `jti`, guaranteed present by [`decode`]
    id: String,
}

impl Token {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    /// Identity id from the `jti` claim
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn into_claims(self) -> ClaimSet {
        self.claims
    }

    /// Recompute the signature with `key` and compare.
    ///
    /// Returns false for any header algorithm other than HS256.
    pub fn verify(&self, key: &HmacKey) -> bool {
        if self.header.alg != ALGORITHM {
            tracing::debug!(alg = %self.header.alg, "Rejecting token with unsupported algorithm");
            return false;
        }
        key.verify(self.signing_input.as_bytes(), &self.signature)
    }
}

/// Serialize and sign a claim set
pub fn encode(claims: &ClaimSet, key: &HmacKey) -> Result<String, TokenError> {
    let header_json = serde_json::to_vec(&Header::default())?;
    let payload_json = serde_json::to_vec(claims)?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(payload_json)
    );
    let signature = key.sign(signing_input.as_bytes());

    Ok(format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Parse a token without verifying its signature
pub fn decode(token: &str) -> Result<Token, TokenError> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed("expected three segments"));
    };

    let header: Header = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header_b64)?)?;
    let claims: ClaimSet = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload_b64)?)?;
    let signature = URL_SAFE_NO_PAD.decode(signature_b64)?;

    let id = check_reserved_claims(&claims)?;

    Ok(Token {
        header,
        claims,
        signing_input: token[..header_b64.len() + 1 + payload_b64.len()].to_string(),
        signature,
        id,
    })
}

fn check_reserved_claims(claims: &ClaimSet) -> Result<String, TokenError> {
    for name in TIME_CLAIMS {
        if let Some(value) = claims.get(name) {
            if value.as_i64().is_none() {
                return Err(TokenError::Malformed("time claim is not an integer"));
            }
        }
    }
    claims
        .id()
        .map(str::to_string)
        .ok_or(TokenError::Malformed("missing or non-string jti claim"))
}

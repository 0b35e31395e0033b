//! Session token codec.
//!
//! Tokens are HS256 JWTs carrying `{sub, iat, exp}`. Verification depends on
//! nothing but the token, the shared secret and the `now` passed in: no I/O,
//! no server-side state, no revocation list. Expiry is checked here with
//! zero leeway rather than by `jsonwebtoken` against the wall clock.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("no token supplied")]
    Missing,

    #[error("token signing key is not configured")]
    Unconfigured,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Claims carried inside a session token. Timestamps are unix seconds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and verifies session tokens with one symmetric key.
pub struct TokenCodec {
    keys: Option<Keys>,
    validation: Validation,
}

impl TokenCodec {
    /// An empty secret yields an unconfigured codec.
    pub fn new(secret: &[u8]) -> Self {
        let keys = (!secret.is_empty()).then(|| Keys {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        });

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self { keys, validation }
    }

    /// A codec that refuses to sign and rejects every token.
    pub fn unconfigured() -> Self {
        Self::new(&[])
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let keys = self.keys.as_ref().ok_or(TokenError::Unconfigured)?;
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Signs a token for `subject`, valid from `now` for `ttl`.
    pub fn issue(
        &self,
        subject: &str,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing("expiry out of range".into()))?;
        let claims = Claims {
            sub: subject.to_owned(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        Ok(IssuedToken { token: self.sign(&claims)?, expires_at })
    }

    /// Checks signature, then expiry against `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Missing);
        }
        let keys = self.keys.as_ref().ok_or(TokenError::Unconfigured)?;

        let claims = jsonwebtoken::decode::<Claims>(token, &keys.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?
            .claims;

        if now.timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

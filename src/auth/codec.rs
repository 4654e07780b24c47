//! Signed session tokens.
//!
//! Tokens are compact JWS strings signed with HMAC-SHA512 over a fixed claim
//! set (`sub`, `iat`, `exp`). The codec owns the key material; callers only
//! ever see token strings and principal ids.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, DurationRound, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Secret bytes used to sign and verify session tokens.
///
/// `Debug` is redacted so the key never ends up in logs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<redacted {} bytes>)", self.0.len())
    }
}

/// Claims carried by every session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Principal id
    pub sub: i64,
    /// Issued at, milliseconds since the epoch
    pub iat: i64,
    /// Expiry, milliseconds since the epoch
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("secret key must not be empty")]
    InvalidKey,

    #[error("token lifetime must be positive")]
    InvalidTtl,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Short label used when logging rejected tokens.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
            TokenError::InvalidKey => "invalid_key",
            TokenError::InvalidTtl => "invalid_ttl",
            TokenError::Signing(_) => "signing",
        }
    }
}

/// Issues and verifies session tokens with a single secret key.
///
/// Built once at startup and shared behind an `Arc` by every component that
/// signs or verifies, so issuance and verification can never disagree on the
/// key.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &SecretKey) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidKey);
        }

        // Expiry is checked by `verify_at` against an explicit clock with no
        // leeway, so the library's own exp handling is switched off.
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// The instant a token issued at `issued_at` for `ttl` stops being valid.
    ///
    /// Claims are kept at millisecond precision, so `issued_at` is truncated
    /// to the millisecond first. Lifetimes that would leave chrono's range
    /// are `InvalidTtl`.
    pub fn expiry(issued_at: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::InvalidTtl);
        }

        issued_at
            .duration_trunc(Duration::milliseconds(1))
            .ok()
            .and_then(|issued_at| issued_at.checked_add_signed(ttl))
            .ok_or(TokenError::InvalidTtl)
    }

    /// Sign a token for `principal_id` valid from `issued_at` for `ttl`.
    pub fn issue(
        &self,
        principal_id: i64,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let expires_at = Self::expiry(issued_at, ttl)?;

        let claims = SessionClaims {
            sub: principal_id,
            iat: issued_at.timestamp_millis(),
            exp: expires_at.timestamp_millis(),
        };

        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token against the process clock.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now` and return the embedded principal id.
    ///
    /// The signature comparison is constant time. A token stops being valid
    /// at its expiry instant; no clock skew grace is applied.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i64, TokenError> {
        let claims = self.decode_claims(token)?;
        let expires_at = DateTime::from_timestamp_millis(claims.exp).ok_or(TokenError::Malformed)?;

        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        Ok(claims.sub)
    }

    fn decode_claims(&self, token: &str) -> Result<SessionClaims, TokenError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS512)
            .finish_non_exhaustive()
    }
}

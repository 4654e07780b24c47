use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::auth::{Principal, TokenCodec, TokenError};

/// A freshly signed token and when it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Seconds until expiry
    pub expires_in: i64,
}

/// Issues session tokens for principals whose credentials were already
/// checked.
///
/// Signs with the same codec instance the authenticator verifies with.
pub struct TokenService {
    codec: Arc<TokenCodec>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(codec: Arc<TokenCodec>, ttl: Duration) -> Self {
        Self { codec, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue_token_for(&self, principal: &Principal) -> Result<IssuedToken, TokenError> {
        self.issue_token_at(principal, Utc::now())
    }

    pub fn issue_token_at(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = TokenCodec::expiry(now, self.ttl)?;
        let token = self.codec.issue(principal.id(), now, self.ttl)?;
        tracing::info!(principal_id = principal.id(), ttl_secs = self.ttl.num_seconds(), "Issued session token");

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: self.ttl.num_seconds(),
        })
    }
}

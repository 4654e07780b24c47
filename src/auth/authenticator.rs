use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::codec::{TokenCodec, TokenError};
use super::Principal;
use crate::database::{DatabaseError, UserStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("principal {0} no longer resolves to a user")]
    UnknownPrincipal(i64),

    #[error("user lookup failed: {0}")]
    Store(#[from] DatabaseError),
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Token(e) => e.kind(),
            AuthError::UnknownPrincipal(_) => "unknown_principal",
            AuthError::Store(_) => "store",
        }
    }
}

/// Resolves a presented bearer token to a principal.
#[async_trait]
pub trait Authenticate: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Bearer-token authenticator: verifies through the shared codec, then
/// resolves the embedded id against the user store.
///
/// Tokens carry no revocation state, so a token for a deleted account is only
/// rejected here, when the id no longer resolves.
pub struct Authenticator {
    codec: Arc<TokenCodec>,
    users: Arc<dyn UserStore>,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>, users: Arc<dyn UserStore>) -> Self {
        Self { codec, users }
    }
}

#[async_trait]
impl Authenticate for Authenticator {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let principal_id = self.codec.verify(token)?;

        let user = self
            .users
            .read_by_id(principal_id)
            .await?
            .ok_or(AuthError::UnknownPrincipal(principal_id))?;

        Ok(Principal::from_user(&user))
    }
}

pub mod authenticator;
pub mod codec;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::database::User;

pub use authenticator::{AuthError, Authenticate, Authenticator};
pub use codec::{SecretKey, SessionClaims, TokenCodec, TokenError};

/// Role granted to every principal resolved from a user record.
pub const ROLE_USER: &str = "user";

/// Identity attached to a request after its token was verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    id: i64,
    display_name: String,
    roles: BTreeSet<String>,
}

impl Principal {
    pub fn new(id: i64, display_name: impl Into<String>, roles: BTreeSet<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            roles,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(
            user.id,
            user.display_name(),
            BTreeSet::from([ROLE_USER.to_string()]),
        )
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

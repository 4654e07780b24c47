//! One-time login challenges.
//!
//! A client asks for a challenge for an email address; the code is handed to
//! a [`ChallengeSink`] for delivery and later exchanged, once, at the token
//! endpoint. Unknown emails, wrong codes and expired codes are all reported
//! as the same `InvalidCredentials` error.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::normalize_email;
use crate::database::{DatabaseError, User, UserStore};

const CHALLENGE_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Delivers a challenge code to the user it was issued for.
pub trait ChallengeSink: Send + Sync {
    fn deliver(&self, user: &User, code: &str);
}

/// Records that a challenge was issued. The code itself is not logged.
#[derive(Debug, Default)]
pub struct LogChallengeSink;

impl ChallengeSink for LogChallengeSink {
    fn deliver(&self, user: &User, _code: &str) {
        tracing::info!(user_id = user.id, "Login challenge issued");
    }
}

#[derive(Debug, Clone)]
struct PendingChallenge {
    code: String,
    user_id: i64,
    expires_at: DateTime<Utc>,
}

pub struct LoginService {
    users: Arc<dyn UserStore>,
    sink: Arc<dyn ChallengeSink>,
    ttl: Duration,
    expose: bool,
    pending: RwLock<HashMap<String, PendingChallenge>>,
}

impl LoginService {
    pub fn new(users: Arc<dyn UserStore>, sink: Arc<dyn ChallengeSink>, ttl: Duration, expose: bool) -> Self {
        Self {
            users,
            sink,
            ttl,
            expose,
            pending: RwLock::new(HashMap::new()),
        }
    }

    pub async fn request_challenge(&self, email: &str) -> Result<Option<String>, LoginError> {
        self.request_challenge_at(email, Utc::now()).await
    }

    /// Issue a fresh challenge for `email`, replacing any earlier one.
    ///
    /// Returns the code only when challenges are exposed (development) and
    /// the email belongs to a user.
    pub async fn request_challenge_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, LoginError> {
        let email = normalize_email(email);

        // The store lookup happens before the lock so a slow store never
        // stalls other logins.
        let user = self.users.read_by_email(&email).await?;

        let mut pending = self.pending.write().await;
        pending.retain(|_, challenge| challenge.expires_at > now);

        let user = match user {
            Some(user) => user,
            None => {
                tracing::debug!("Login challenge requested for unknown email");
                return Ok(None);
            }
        };

        let code = new_code();
        pending.insert(
            email,
            PendingChallenge {
                code: code.clone(),
                user_id: user.id,
                expires_at: now + self.ttl,
            },
        );
        drop(pending);
        self.sink.deliver(&user, &code);

        Ok(self.expose.then_some(code))
    }

    pub async fn redeem(&self, email: &str, challenge: &str) -> Result<Principal, LoginError> {
        self.redeem_at(email, challenge, Utc::now()).await
    }

    /// Exchange a challenge for the principal it was issued to.
    ///
    /// Any attempt consumes the pending challenge, right or wrong, so a code
    /// gets exactly one guess. The flip side: anyone who knows an email can
    /// void that user's pending code with a wrong guess, and the user then
    /// has to request a new one.
    pub async fn redeem_at(
        &self,
        email: &str,
        challenge: &str,
        now: DateTime<Utc>,
    ) -> Result<Principal, LoginError> {
        let email = normalize_email(email);
        let pending = self
            .pending
            .write()
            .await
            .remove(&email)
            .ok_or(LoginError::InvalidCredentials)?;

        let supplied = challenge.trim().to_ascii_uppercase();
        if pending.expires_at <= now || !codes_match(&pending.code, &supplied) {
            return Err(LoginError::InvalidCredentials);
        }

        let user = self
            .users
            .read_by_id(pending.user_id)
            .await?
            .ok_or(LoginError::InvalidCredentials)?;

        Ok(Principal::from_user(&user))
    }
}

fn new_code() -> String {
    Uuid::new_v4().simple().to_string()[..CHALLENGE_LEN].to_ascii_uppercase()
}

/// Compares every byte regardless of where the first mismatch is
fn codes_match(expected: &str, supplied: &str) -> bool {
    if expected.len() != supplied.len() {
        return false;
    }
    expected
        .bytes()
        .zip(supplied.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

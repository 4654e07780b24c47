use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{normalize_email, NewUser, User};

/// Persistence operations for user records.
///
/// Ids are assigned by the store on `create`. Emails are unique and compared
/// after normalization.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<i64, DatabaseError>;

    async fn read_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn read_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// All users ordered by id
    async fn read_all(&self) -> Result<Vec<User>, DatabaseError>;

    /// Returns `false` when no user with that id exists
    async fn update(&self, user: &User) -> Result<bool, DatabaseError>;

    /// Returns `false` when no user with that id exists
    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<i64, User>,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<i64, DatabaseError> {
        let mut state = self.state.write().await;
        let email = user.normalized_email();
        if state.email_taken(&email, None) {
            return Err(DatabaseError::Conflict(format!("email {} is already in use", email)));
        }

        state.last_id += 1;
        let id = state.last_id;
        state.users.insert(id, user.with_id(id));
        Ok(id)
    }

    async fn read_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn read_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let email = normalize_email(email);
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn read_all(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn update(&self, user: &User) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Ok(false);
        }
        let mut user = user.clone();
        user.email = normalize_email(&user.email);
        if state.email_taken(&user.email, Some(user.id)) {
            return Err(DatabaseError::Conflict(format!("email {} is already in use", user.email)));
        }
        state.users.insert(user.id, user);
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.state.write().await.users.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

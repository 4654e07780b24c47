use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::HealthReport;
use crate::database::{DatabaseError, NewUser, User, UserStore};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid user: {0:?}")]
    Invalid(HashMap<String, String>),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// User record operations on top of the configured store.
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn read_user_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        Ok(self.store.read_by_id(id).await?)
    }

    pub async fn read_all_users(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.read_all().await?)
    }

    pub async fn store_user(&self, user: NewUser) -> Result<User, UserError> {
        user.validate().map_err(UserError::Invalid)?;
        let id = self.store.create(user.clone()).await?;
        tracing::info!(user_id = id, "Created user");
        Ok(user.with_id(id))
    }

    /// Replace the fields of user `id`; `None` if it does not exist
    pub async fn update_user(&self, id: i64, fields: NewUser) -> Result<Option<User>, UserError> {
        fields.validate().map_err(UserError::Invalid)?;
        let user = fields.with_id(id);
        if self.store.update(&user).await? {
            tracing::info!(user_id = id, "Updated user");
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn delete_user(&self, id: i64) -> Result<bool, UserError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            tracing::info!(user_id = id, "Deleted user");
        }
        Ok(deleted)
    }

    /// Insert each seed user whose email is not taken yet
    pub async fn seed(&self, users: &[NewUser]) -> Result<usize, UserError> {
        let mut created = 0;
        for user in users {
            if self.store.read_by_email(&user.email).await?.is_none() {
                self.store_user(user.clone()).await?;
                created += 1;
            }
        }
        Ok(created)
    }

    pub async fn health(&self) -> HealthReport {
        match self.store.ping().await {
            Ok(()) => HealthReport::healthy("users"),
            Err(e) => {
                tracing::warn!("User store health check failed: {}", e);
                HealthReport::unhealthy("users", "user store unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryUserStore;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryUserStore::new()))
    }

    fn linus() -> NewUser {
        NewUser {
            first_name: "Linus".to_string(),
            last_name: "Torvalds".to_string(),
            phone: "123".to_string(),
            email: "linus@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn stores_and_reads_users() {
        let users = service();
        let stored = users.store_user(linus()).await.unwrap();

        assert_eq!(users.read_user_by_id(stored.id).await.unwrap(), Some(stored.clone()));
        assert_eq!(users.read_user_by_id(stored.id + 1).await.unwrap(), None);
        assert_eq!(users.read_all_users().await.unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn rejects_invalid_user_before_storing() {
        let users = service();
        let mut user = linus();
        user.email = "not-an-email".to_string();

        assert!(matches!(users.store_user(user).await, Err(UserError::Invalid(_))));
        assert!(users.read_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_missing_user() {
        let users = service();
        assert_eq!(users.update_user(5, linus()).await.unwrap(), None);
        assert!(!users.delete_user(5).await.unwrap());

        let stored = users.store_user(linus()).await.unwrap();
        let mut fields = linus();
        fields.phone = "999".to_string();
        let updated = users.update_user(stored.id, fields).await.unwrap().unwrap();
        assert_eq!(updated.phone, "999");
        assert!(users.delete_user(stored.id).await.unwrap());
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let users = service();
        assert_eq!(users.seed(&[linus()]).await.unwrap(), 1);
        assert_eq!(users.seed(&[linus()]).await.unwrap(), 0);
        assert_eq!(users.read_all_users().await.unwrap().len(), 1);
        assert!(users.health().await.healthy);
    }
}

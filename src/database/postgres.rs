use async_trait::async_trait;
use sqlx::PgPool;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{normalize_email, NewUser, User};
use super::user_store::UserStore;

const USER_COLUMNS: &str = "id, first_name, last_name, phone, email";

/// `UserStore` backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations on the email index become `Conflict`
fn map_write_error(err: sqlx::Error, email: &str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::Conflict(format!("email {} is already in use", email))
        }
        _ => DatabaseError::Sqlx(err),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<i64, DatabaseError> {
        let user = user.with_id(0);
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, phone, email) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user.email))?;

        Ok(id)
    }

    async fn read_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn read_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn read_all(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<bool, DatabaseError> {
        let email = normalize_email(&user.email);
        let result = sqlx::query(
            "UPDATE users SET first_name = $1, last_name = $2, phone = $3, email = $4 WHERE id = $5",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&email)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &email))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// User fields as submitted by clients, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    pub email: String,
}

impl NewUser {
    /// Check required fields, returning per-field messages on failure.
    pub fn validate(&self) -> Result<(), HashMap<String, String>> {
        let mut field_errors = HashMap::new();

        if self.first_name.trim().is_empty() {
            field_errors.insert("firstName".to_string(), "This field is required".to_string());
        }
        if self.last_name.trim().is_empty() {
            field_errors.insert("lastName".to_string(), "This field is required".to_string());
        }
        let email = self.email.trim();
        if email.is_empty() {
            field_errors.insert("email".to_string(), "This field is required".to_string());
        } else if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            field_errors.insert("email".to_string(), format!("Invalid email address: {}", email));
        }

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(field_errors)
        }
    }

    /// Lower-cased, trimmed email used as the lookup key.
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }

    pub fn with_id(self, id: i64) -> User {
        User {
            id,
            email: self.normalized_email(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

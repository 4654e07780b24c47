use std::env;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;

use crate::auth::SecretKey;
use crate::database::NewUser;

/// Signing key used when a development profile runs without one configured.
const DEVELOPMENT_SECRET: &[u8] = b"userdesk-development-secret-do-not-use-in-production";

/// Minimum secret length accepted outside development.
pub const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

/// Upper bound for token and challenge lifetimes (one leap year).
pub const MAX_TTL_MINUTES: u64 = 366 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    /// Users inserted at startup when no user with the same email exists
    #[serde(default)]
    pub seed_users: Vec<NewUser>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "production" | "prod" => Some(Environment::Production),
            "staging" | "stage" => Some(Environment::Staging),
            "development" | "dev" => Some(Environment::Development),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL; the in-memory store is used when absent
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
    pub migrate_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default, skip_serializing)]
    pub token_secret: Option<SecretKey>,
    pub token_ttl_minutes: u64,
    pub challenge_ttl_minutes: u64,
    /// Return login challenges in the HTTP response instead of only delivering them
    pub expose_challenge: bool,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Profile defaults from `APP_ENV`, overlaid by the optional YAML file,
    /// then by environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some(Self::read_file(path)?),
            None => None,
        };
        Self::assemble(file, |key| env::var(key).ok())
    }

    fn read_file(path: &Path) -> Result<Value, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&text)?)
    }

    fn assemble(
        file: Option<Value>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let environment = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value).ok_or(ConfigError::InvalidValue {
                key: "APP_ENV",
                value,
            })?,
            None => file
                .as_ref()
                .and_then(|f| f.get("environment"))
                .and_then(Value::as_str)
                .and_then(Environment::parse)
                .unwrap_or(Environment::Development),
        };

        let mut config = Self::for_environment(environment);
        if let Some(mut overlay) = file {
            if let Value::Mapping(mapping) = &mut overlay {
                mapping.remove("environment");
            }
            let mut base = serde_yaml::to_value(&config)?;
            merge(&mut base, overlay);
            config = serde_yaml::from_value(base)?;
        }
        config.environment = environment;

        config.with_env_overrides(lookup)
    }

    fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Server overrides
        if let Some(v) = lookup("USERDESK_PORT").or_else(|| lookup("PORT")) {
            self.server.port = parse("USERDESK_PORT", v)?;
        }
        if let Some(v) = lookup("USERDESK_HOST") {
            self.server.host = v;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v).filter(|url| !url.trim().is_empty());
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DATABASE_MAX_CONNECTIONS", v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse("DATABASE_CONNECTION_TIMEOUT", v)?;
        }
        if let Some(v) = lookup("DATABASE_MIGRATE_ON_START") {
            self.database.migrate_on_start = parse("DATABASE_MIGRATE_ON_START", v)?;
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_TOKEN_SECRET") {
            self.security.token_secret = Some(SecretKey::from(v));
        }
        if let Some(v) = lookup("SECURITY_TOKEN_TTL_MINUTES") {
            self.security.token_ttl_minutes = parse("SECURITY_TOKEN_TTL_MINUTES", v)?;
        }
        if let Some(v) = lookup("SECURITY_CHALLENGE_TTL_MINUTES") {
            self.security.challenge_ttl_minutes = parse("SECURITY_CHALLENGE_TTL_MINUTES", v)?;
        }
        if let Some(v) = lookup("SECURITY_EXPOSE_CHALLENGE") {
            self.security.expose_challenge = parse("SECURITY_EXPOSE_CHALLENGE", v)?;
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = parse("SECURITY_ENABLE_CORS", v)?;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(self)
    }

    /// Reject configurations the server must not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ttl("security.token_ttl_minutes", self.security.token_ttl_minutes)?;
        check_ttl("security.challenge_ttl_minutes", self.security.challenge_ttl_minutes)?;
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be positive".into()));
        }

        match (&self.security.token_secret, self.environment) {
            (Some(secret), _) if secret.is_empty() => {
                Err(ConfigError::Invalid("security.token_secret must not be empty".into()))
            }
            (None, Environment::Development) => Ok(()),
            (None, environment) => Err(missing_secret(environment)),
            (Some(secret), environment)
                if environment != Environment::Development && secret.len() < MIN_PRODUCTION_SECRET_BYTES =>
            {
                Err(ConfigError::Invalid(format!(
                    "security.token_secret must be at least {} bytes in {:?}",
                    MIN_PRODUCTION_SECRET_BYTES, environment
                )))
            }
            (_, Environment::Production) if self.security.expose_challenge => Err(
                ConfigError::Invalid("security.expose_challenge is not allowed in production".into()),
            ),
            _ => Ok(()),
        }
    }

    /// The signing key. Only development may fall back to the built-in key,
    /// and only on a loopback listener by default.
    pub fn token_secret(&self) -> Result<SecretKey, ConfigError> {
        match (&self.security.token_secret, self.environment) {
            (Some(secret), _) => Ok(secret.clone()),
            (None, Environment::Development) => {
                tracing::warn!("No token secret configured; using the development signing key");
                Ok(SecretKey::new(DEVELOPMENT_SECRET))
            }
            (None, environment) => Err(missing_secret(environment)),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        ttl_minutes(self.security.token_ttl_minutes)
    }

    pub fn challenge_ttl(&self) -> Duration {
        ttl_minutes(self.security.challenge_ttl_minutes)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Built-in defaults for one environment, before any overlay
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                migrate_on_start: true,
            },
            security: SecurityConfig {
                token_secret: None,
                token_ttl_minutes: 24 * 60,
                challenge_ttl_minutes: 15,
                expose_challenge: true,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            seed_users: Vec::new(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
                migrate_on_start: true,
            },
            security: SecurityConfig {
                token_secret: None,
                token_ttl_minutes: 24 * 60,
                challenge_ttl_minutes: 10,
                expose_challenge: false,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            seed_users: Vec::new(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
                migrate_on_start: false,
            },
            security: SecurityConfig {
                token_secret: None,
                token_ttl_minutes: 8 * 60,
                challenge_ttl_minutes: 10,
                expose_challenge: false,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            seed_users: Vec::new(),
        }
    }
}

fn check_ttl(key: &str, minutes: u64) -> Result<(), ConfigError> {
    if minutes == 0 || minutes > MAX_TTL_MINUTES {
        return Err(ConfigError::Invalid(format!(
            "{} must be between 1 and {}",
            key, MAX_TTL_MINUTES
        )));
    }
    Ok(())
}

/// Clamped so an unvalidated config can never overflow chrono
fn ttl_minutes(minutes: u64) -> Duration {
    Duration::minutes(minutes.min(MAX_TTL_MINUTES) as i64)
}

fn missing_secret(environment: Environment) -> ConfigError {
    ConfigError::Invalid(format!(
        "security.token_secret is required in {:?}",
        environment
    ))
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

/// Recursively overlay mappings; any other value replaces the base.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

pub mod license_service;
pub mod login_service;
pub mod token_service;
pub mod user_service;

use serde::Serialize;

pub use license_service::{LicenseInfo, LicenseService};
pub use login_service::{ChallengeSink, LogChallengeSink, LoginError, LoginService};
pub use token_service::{IssuedToken, TokenService};
pub use user_service::{UserError, UserService};

/// Outcome of one service's health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub name: &'static str,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthReport {
    pub fn healthy(name: &'static str) -> Self {
        Self {
            name,
            healthy: true,
            detail: None,
        }
    }

    pub fn unhealthy(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

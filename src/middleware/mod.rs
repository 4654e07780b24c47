pub mod auth;
pub mod response;

pub use auth::{require_principal, AuthPrincipal};
pub use response::{ApiResponse, ApiResult};

use crate::auth::Principal;
use crate::middleware::{ApiResponse, ApiResult, AuthPrincipal};

/// GET /api/auth/whoami - the principal resolved from the bearer token
pub async fn whoami(AuthPrincipal(principal): AuthPrincipal) -> ApiResult<Principal> {
    Ok(ApiResponse::success(principal))
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::LicenseInfo;

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "userdesk",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "license": "/license (public)",
                "auth": "/auth/challenge, /auth/token (public - token acquisition)",
                "whoami": "/api/auth/whoami (protected)",
                "users": "/api/users[/:id] (protected)",
            }
        }
    }))
}

/// GET /health - run every service health check
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let checks = vec![state.license.health(), state.users.health().await];
    let healthy = checks.iter().all(|check| check.healthy);

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "success": healthy,
            "data": {
                "status": if healthy { "ok" } else { "degraded" },
                "timestamp": now,
                "checks": checks,
            }
        })),
    )
}

/// GET /license
pub async fn license(State(state): State<AppState>) -> ApiResult<LicenseInfo> {
    Ok(ApiResponse::success(state.license.license().clone()))
}

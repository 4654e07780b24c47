use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::IssuedToken;

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub challenge: String,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub status: &'static str,
    /// Only present when the server exposes challenges (development)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

/// POST /auth/challenge - start a login for an email address
///
/// Always answers 202 so the response does not reveal whether the email
/// belongs to an account.
pub async fn challenge_post(
    State(state): State<AppState>,
    Json(payload): Json<ChallengeRequest>,
) -> ApiResult<ChallengeResponse> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation_error("email is required", None));
    }

    let challenge = state.logins.request_challenge(&payload.email).await?;

    Ok(ApiResponse::accepted(ChallengeResponse {
        status: "challenge_sent",
        challenge,
    }))
}

/// POST /auth/token - exchange a login challenge for a session token
///
/// ```json
/// { "email": "ada@example.com", "challenge": "1F0C9A2B" }
/// ```
///
/// Responds with `{ token, expires_at, expires_in }`. Any credential problem
/// yields the same 401.
pub async fn token_post(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<IssuedToken> {
    let principal = state
        .logins
        .redeem(&payload.email, &payload.challenge)
        .await
        .map_err(|e| {
            tracing::debug!("Token request rejected: {}", e);
            ApiError::from(e)
        })?;

    let issued = state.tokens.issue_token_for(&principal)?;
    Ok(ApiResponse::success(issued))
}

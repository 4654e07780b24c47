use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::app::AppState;
use crate::database::{NewUser, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthPrincipal};

/// GET /api/users - all users ordered by id
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(ApiResponse::success(state.users.read_all_users().await?))
}

/// GET /api/users/:id - 200 with the record, 404 when it does not exist
pub async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<User> {
    match state.users.read_user_by_id(id).await? {
        Some(user) => Ok(ApiResponse::success(user)),
        None => Err(ApiError::not_found(format!("User {} not found", id))),
    }
}

/// POST /api/users - 201 with the stored record and its `Location`
pub async fn create_user(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.store_user(payload).await?;
    tracing::debug!(created_by = principal.id(), user_id = user.id, "User created via API");

    let location = format!("/api/users/{}", user.id);
    Ok(([(header::LOCATION, location)], ApiResponse::created(user)))
}

/// PUT /api/users/:id - replace all fields of an existing user
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<NewUser>,
) -> ApiResult<User> {
    match state.users.update_user(id, payload).await? {
        Some(user) => Ok(ApiResponse::success(user)),
        None => Err(ApiError::not_found(format!("User {} not found", id))),
    }
}

/// DELETE /api/users/:id
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    if state.users.delete_user(id).await? {
        Ok(ApiResponse::no_content())
    } else {
        Err(ApiError::not_found(format!("User {} not found", id)))
    }
}

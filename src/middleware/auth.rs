use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{Authenticate, Principal};
use crate::error::ApiError;

/// Bearer-token gate for protected routes.
///
/// Requests without a usable `Authorization: Bearer` header are rejected
/// before the authenticator is consulted. Every rejection gets the same 401
/// response; the reason is only logged.
pub async fn require_principal(
    State(authenticator): State<Arc<dyn Authenticate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(reason) => {
            tracing::debug!(reason, "Rejected request without bearer token");
            return ApiError::unauthorized().into_response();
        }
    };

    match authenticator.authenticate(&token).await {
        Ok(principal) => {
            tracing::debug!(principal_id = principal.id(), "Authenticated request");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(kind = e.kind(), "Rejected bearer token");
            ApiError::unauthorized().into_response()
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or("missing authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "authorization header is not valid ASCII")?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or("authorization header is not in scheme-token form")?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("authorization scheme is not bearer");
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}

/// The principal the gate attached to this request.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthPrincipal)
            .ok_or_else(ApiError::unauthorized)
    }
}

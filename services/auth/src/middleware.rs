//! Middleware for JWT token validation and role gating

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use common::token::{Claims, bearer_token};
use tracing::warn;

use crate::{AppState, error::AuthError};

/// Extract and validate the bearer token, exposing its claims to handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AuthError::Unauthorized)?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        warn!("Failed to validate token: {}", e);
        AuthError::Unauthorized
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Reject callers whose token does not carry the admin role
///
/// Must run inside [`auth_middleware`].
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, AuthError> {
    let is_admin = req
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.role.is_admin())
        .ok_or(AuthError::Unauthorized)?;

    if !is_admin {
        return Err(AuthError::Forbidden(
            "Access denied: insufficient role".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

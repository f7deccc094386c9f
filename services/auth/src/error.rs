//! Custom error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing or malformed input
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or expired token
    #[error("Unauthorized")]
    Unauthorized,

    /// Password did not match
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// No user with the given identity
    #[error("User not found")]
    UserNotFound,

    /// Email or mobile already registered
    #[error("{0}")]
    Conflict(String),

    /// Too many login attempts
    #[error("Too many login attempts, try again later")]
    TooManyRequests,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", e);
        AuthError::InternalServerError
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

/// Type alias for handler results
pub type AuthResult<T> = Result<T, AuthError>;

//! Credential service: signup, login and role-gated endpoints
//!
//! Exposed as a library so the binary and the integration tests build the
//! same router.

pub mod bootstrap;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod validation;

use common::token::JwtConfig;
use sqlx::SqlitePool;

use crate::{
    jwt::JwtService,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Wire the repositories and services around an initialised pool
    pub fn new(pool: SqlitePool, jwt_config: JwtConfig, limiter: RateLimiterConfig) -> Self {
        Self {
            user_repository: UserRepository::new(pool.clone()),
            jwt_service: JwtService::new(jwt_config),
            rate_limiter: RateLimiter::new(limiter),
            db_pool: pool,
        }
    }
}

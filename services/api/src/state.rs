//! Application state shared across handlers

use common::token::{JwtConfig, TokenVerifier};
use sqlx::SqlitePool;

use crate::{
    config::PaymentConfig,
    repositories::{BookingRepository, PaymentRepository, RatingRepository, VillaRepository},
    signature::PaymentSigner,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub token_verifier: TokenVerifier,
    pub villa_repository: VillaRepository,
    pub booking_repository: BookingRepository,
    pub rating_repository: RatingRepository,
    pub payment_repository: PaymentRepository,
    pub payment_config: PaymentConfig,
    pub payment_signer: PaymentSigner,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt_config: &JwtConfig, payment_config: PaymentConfig) -> Self {
        Self {
            token_verifier: TokenVerifier::new(jwt_config),
            villa_repository: VillaRepository::new(pool.clone()),
            booking_repository: BookingRepository::new(pool.clone()),
            rating_repository: RatingRepository::new(pool.clone()),
            payment_repository: PaymentRepository::new(pool.clone()),
            payment_signer: PaymentSigner::new(payment_config.key_secret.clone()),
            payment_config,
            db_pool: pool,
        }
    }
}

//! Common library for the StayBook application
//!
//! This crate provides shared functionality used across the services and the
//! client, including database connectivity, listener configuration, the
//! session token format, the role and booking status enums, and the
//! availability calculator.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod availability;
pub mod booking;
pub mod database;
pub mod error;
pub mod role;
pub mod server;
pub mod token;

pub use availability::{Availability, DateRange, Reservation};
pub use booking::BookingStatus;
pub use role::Role;

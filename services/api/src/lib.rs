//! Booking API: villas, bookings, ratings and payments

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod scheduler;
pub mod signature;
pub mod state;

pub use state::AppState;

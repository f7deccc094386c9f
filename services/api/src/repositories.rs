//! Repositories for database operations

pub mod booking;
pub mod payment;
pub mod rating;
pub mod villa;

pub use booking::{BookingRepository, NewBookingOutcome};
pub use payment::PaymentRepository;
pub use rating::RatingRepository;
pub use villa::VillaRepository;

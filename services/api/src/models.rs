//! API models for request and response payloads

pub mod booking;
pub mod payment;
pub mod rating;
pub mod villa;

pub use booking::{AvailabilityRequest, AvailabilityResponse, Booking, BookingSummary, CreateBooking};
pub use payment::{Payment, PaymentOrder, PaymentStatus, PaymentVerification, RefundRequest};
pub use rating::{CreateRating, Rating, UpdateRating};
pub use villa::{CreateVilla, UpdateVilla, Villa, VillaAvailability, VillaQuery, VillaSort};

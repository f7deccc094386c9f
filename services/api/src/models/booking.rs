//! Booking models for the API service

use chrono::{DateTime, NaiveDate, Utc};
use common::{BookingStatus, DateRange, Reservation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub villa_id: Uuid,
    pub user_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn range(&self) -> Option<DateRange> {
        DateRange::new(self.check_in, self.check_out)
    }
}

impl Reservation for Booking {
    fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    fn status(&self) -> BookingStatus {
        self.status
    }
}

/// Request body for creating a booking for the caller
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub villa_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// Request body for an availability check
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRequest {
    pub villa_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// Result of an availability check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub villa_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub available: bool,
    pub number_of_nights: i64,
    pub estimated_price: f64,
    /// First held interval colliding with the request, if any
    pub conflict: Option<DateRange>,
}

/// Booking counts per status and revenue from confirmed bookings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingSummary {
    pub total_bookings: i64,
    pub pending_bookings: i64,
    pub confirmed_bookings: i64,
    pub cancelled_bookings: i64,
    pub failed_bookings: i64,
    pub total_revenue: f64,
}

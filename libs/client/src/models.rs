//! Wire types exchanged with the credential service and the booking API

use chrono::{DateTime, NaiveDate, Utc};
use common::{BookingStatus, DateRange, Reservation, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile fields kept alongside the session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginForm<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub role: Role,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Villa {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub price_per_night: f64,
    pub image_urls: Vec<String>,
    pub average_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub villa_id: Uuid,
    pub user_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
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

/// Listing created from the admin dashboard
#[derive(Debug, Clone, Serialize)]
pub struct NewVilla {
    pub name: String,
    pub description: String,
    pub address: String,
    pub price_per_night: f64,
    pub image_urls: Vec<String>,
}

/// Stay requested by the signed-in guest
#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub villa_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VillaAvailability {
    pub villa_id: Uuid,
    pub booked: Vec<DateRange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityCheck {
    pub available: bool,
    pub number_of_nights: i64,
    pub estimated_price: f64,
    pub conflict: Option<DateRange>,
}

/// Checkout parameters for the payment widget
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentOrder {
    pub key_id: String,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub booking_id: Uuid,
    pub payment_id: Uuid,
    pub villa_name: String,
}

/// Signed callback returned by the payment widget
#[derive(Debug, Clone, Serialize)]
pub struct PaymentVerification {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedPayment {
    pub message: String,
    pub booking: Booking,
}

//! Payment models for the API service

use chrono::{DateTime, Utc};
use common::error::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(PaymentStatus::Pending),
            "COMPLETED" => Ok(PaymentStatus::Completed),
            "FAILED" => Ok(PaymentStatus::Failed),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            _ => Err(ParseEnumError::new("payment status", s)),
        }
    }
}

/// Payment attached to exactly one booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub method: String,
    pub gateway: String,
    pub order_id: String,
    /// Gateway payment id, known once the checkout completes
    pub transaction_id: Option<String>,
    /// Amount returned to the guest once refunded
    pub refund_amount: Option<f64>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the checkout widget needs to collect a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub key_id: String,
    pub order_id: String,
    /// Amount in minor currency units
    pub amount: i64,
    pub currency: String,
    pub booking_id: Uuid,
    pub payment_id: Uuid,
    pub villa_name: String,
}

/// Checkout callback forwarded by the client
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentVerification {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub signature: String,
}

/// Admin request to return a completed payment
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RefundRequest {
    pub payment_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub reason: String,
}

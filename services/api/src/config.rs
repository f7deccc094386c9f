//! Environment-driven configuration for the API service

use anyhow::Result;
use std::env;

/// Payment gateway configuration
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Public key id handed to the checkout widget
    pub key_id: String,
    /// Secret used to sign checkout callbacks
    pub key_secret: String,
    /// ISO currency code for orders
    pub currency: String,
    /// Gateway name recorded on payments
    pub gateway: String,
}

impl PaymentConfig {
    /// Create a new PaymentConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PAYMENT_KEY_ID`: Gateway key id (required)
    /// - `PAYMENT_KEY_SECRET`: Gateway key secret (required)
    /// - `PAYMENT_CURRENCY`: Order currency (default: "INR")
    /// - `PAYMENT_GATEWAY`: Gateway name (default: "razorpay")
    pub fn from_env() -> Result<Self> {
        let key_id = env::var("PAYMENT_KEY_ID")
            .map_err(|_| anyhow::anyhow!("PAYMENT_KEY_ID environment variable not set"))?;
        let key_secret = env::var("PAYMENT_KEY_SECRET")
            .map_err(|_| anyhow::anyhow!("PAYMENT_KEY_SECRET environment variable not set"))?;

        if key_secret.trim().is_empty() {
            anyhow::bail!("PAYMENT_KEY_SECRET must not be empty");
        }

        Ok(PaymentConfig {
            key_id,
            key_secret,
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            gateway: env::var("PAYMENT_GATEWAY").unwrap_or_else(|_| "razorpay".to_string()),
        })
    }
}

/// Pending-booking expiry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryConfig {
    /// How long a booking may stay pending, in seconds
    pub pending_ttl_seconds: u64,
    /// Cron expression (with seconds) for the sweeper
    pub schedule: String,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            pending_ttl_seconds: 900,
            schedule: "0 * * * * *".to_string(),
        }
    }
}

impl ExpiryConfig {
    /// Create a new ExpiryConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PENDING_BOOKING_TTL_SECONDS`: Pending lifetime (default: 900)
    /// - `PENDING_BOOKING_SWEEP_SCHEDULE`: Sweep schedule (default: every minute)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let pending_ttl_seconds = env::var("PENDING_BOOKING_TTL_SECONDS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.pending_ttl_seconds);

        let schedule =
            env::var("PENDING_BOOKING_SWEEP_SCHEDULE").unwrap_or(defaults.schedule);

        Self {
            pending_ttl_seconds,
            schedule,
        }
    }
}

//! Checkout callback signatures
//!
//! The gateway signs `order_id|payment_id` with HMAC-SHA256 under the key
//! secret and sends the hex digest back through the client.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies checkout callbacks for one gateway key
#[derive(Clone)]
pub struct PaymentSigner {
    secret: String,
}

impl PaymentSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Some(mac)
    }

    /// Hex signature the gateway would send for this pair
    pub fn sign(&self, order_id: &str, payment_id: &str) -> Option<String> {
        self.mac(order_id, payment_id)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of a hex signature
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };

        match self.mac(order_id, payment_id) {
            Some(mac) => mac.verify_slice(&expected).is_ok(),
            None => false,
        }
    }
}

/// Fresh gateway order id
pub fn new_order_id() -> String {
    format!("order_{}", Uuid::new_v4().simple())
}

/// Convert a major-unit amount to minor units (e.g. rupees to paise)
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

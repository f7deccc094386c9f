//! Payment repository for database operations

use anyhow::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Payment, PaymentStatus};

const PAYMENT_COLUMNS: &str = "id, booking_id, amount, currency, method, gateway, order_id, transaction_id, refund_amount, status, created_at, updated_at";

fn payment_from_row(row: &SqliteRow) -> Result<Payment> {
    let status: String = row.try_get("status")?;

    Ok(Payment {
        id: row.try_get("id")?,
        booking_id: row.try_get("booking_id")?,
        amount: row.try_get("amount")?,
        currency: row.try_get("currency")?,
        method: row.try_get("method")?,
        gateway: row.try_get("gateway")?,
        order_id: row.try_get("order_id")?,
        transaction_id: row.try_get("transaction_id")?,
        refund_amount: row.try_get("refund_amount")?,
        status: status.parse::<PaymentStatus>()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Payment repository for database operations
#[derive(Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a pending payment for a booking
    pub async fn create(
        &self,
        booking_id: Uuid,
        amount: f64,
        currency: &str,
        gateway: &str,
        order_id: &str,
    ) -> Result<Payment> {
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            booking_id,
            amount,
            currency: currency.to_string(),
            method: "ONLINE".to_string(),
            gateway: gateway.to_string(),
            order_id: order_id.to_string(),
            transaction_id: None,
            refund_amount: None,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(&format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.method)
        .bind(&payment.gateway)
        .bind(&payment.order_id)
        .bind(&payment.transaction_id)
        .bind(payment.refund_amount)
        .bind(payment.status.as_str())
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await?;

        info!("Created payment order {} for booking {}", order_id, booking_id);
        Ok(payment)
    }

    pub async fn find_by_booking(&self, booking_id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = ?"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(payment_from_row).transpose()
    }

    pub async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(payment_from_row).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(payment_from_row).collect()
    }

    /// Settle a pending payment and move its pending booking along with it
    ///
    /// A successful payment completes and confirms the booking; a failed one
    /// fails both. Returns false, changing nothing, when either side has
    /// already left `PENDING`.
    pub async fn settle(&self, payment: &Payment, transaction_id: &str, success: bool) -> Result<bool> {
        let (payment_status, booking_status) = if success {
            (PaymentStatus::Completed, "CONFIRMED")
        } else {
            (PaymentStatus::Failed, "FAILED")
        };
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let booking = sqlx::query(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = 'PENDING'",
        )
        .bind(booking_status)
        .bind(now)
        .bind(payment.booking_id)
        .execute(&mut *tx)
        .await?;

        let settled = sqlx::query(
            "UPDATE payments SET status = ?, transaction_id = ?, updated_at = ? WHERE id = ? AND status = 'PENDING'",
        )
        .bind(payment_status.as_str())
        .bind(transaction_id)
        .bind(now)
        .bind(payment.id)
        .execute(&mut *tx)
        .await?;

        if booking.rows_affected() == 0 || settled.rows_affected() == 0 {
            tx.rollback().await?;
            warn!("Payment {} or its booking is no longer pending", payment.order_id);
            return Ok(false);
        }

        tx.commit().await?;
        info!("Payment {} settled as {}", payment.order_id, payment_status);
        Ok(true)
    }

    /// Mark a completed payment as refunded by `amount`
    ///
    /// Returns false when the payment is missing or not `COMPLETED`.
    pub async fn refund(&self, id: Uuid, amount: f64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'REFUNDED', refund_amount = ?, updated_at = ? WHERE id = ? AND status = 'COMPLETED'",
        )
        .bind(amount)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("Refunded {} on payment {}", amount, id);
        }
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(payment_from_row).transpose()
    }
}

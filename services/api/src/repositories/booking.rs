//! Booking repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use common::{Availability, BookingStatus, DateRange};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{Booking, BookingSummary};

const BOOKING_COLUMNS: &str =
    "id, villa_id, user_id, check_in, check_out, total_price, status, created_at, updated_at";

fn booking_from_row(row: &SqliteRow) -> Result<Booking> {
    let status: String = row.try_get("status")?;

    Ok(Booking {
        id: row.try_get("id")?,
        villa_id: row.try_get("villa_id")?,
        user_id: row.try_get("user_id")?,
        check_in: row.try_get("check_in")?,
        check_out: row.try_get("check_out")?,
        total_price: row.try_get("total_price")?,
        status: status.parse::<BookingStatus>()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Result of trying to hold a date range
#[derive(Debug, Clone, PartialEq)]
pub enum NewBookingOutcome {
    Created(Booking),
    /// An active booking already holds part of the range
    Overlaps(DateRange),
}

/// Booking repository for database operations
#[derive(Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Create a new booking repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a pending booking unless an active one overlaps `range`
    ///
    /// The overlap check and the insert share one transaction.
    pub async fn create(
        &self,
        user_id: Uuid,
        villa_id: Uuid,
        range: DateRange,
        total_price: f64,
    ) -> Result<NewBookingOutcome> {
        let mut tx = self.pool.begin().await?;

        // Take the write lock before reading so concurrent creations serialise.
        sqlx::query("UPDATE villas SET updated_at = updated_at WHERE id = ?")
            .bind(villa_id)
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE villa_id = ? AND status IN ('PENDING', 'CONFIRMED')"
        ))
        .bind(villa_id)
        .fetch_all(&mut *tx)
        .await?;
        let held = rows
            .iter()
            .map(booking_from_row)
            .collect::<Result<Vec<_>>>()?;

        if let Some(conflict) = Availability::from_reservations(&held).first_conflict(&range) {
            tx.rollback().await?;
            return Ok(NewBookingOutcome::Overlaps(conflict));
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            villa_id,
            user_id,
            check_in: range.start,
            check_out: range.end,
            total_price,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(booking.id)
        .bind(booking.villa_id)
        .bind(booking.user_id)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.total_price)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Created booking {} for villa {} ({} to {})",
            booking.id, villa_id, range.start, range.end
        );
        Ok(NewBookingOutcome::Created(booking))
    }

    /// Find a booking by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    /// Every booking, most recent stay first
    pub async fn list_all(&self) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY check_in DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }

    /// Bookings made by one user, most recent stay first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ? ORDER BY check_in DESC, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }

    /// Pending and confirmed bookings of a villa, in stay order
    pub async fn active_for_villa(&self, villa_id: Uuid) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE villa_id = ? AND status IN ('PENDING', 'CONFIRMED') ORDER BY check_in"
        ))
        .bind(villa_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }

    /// Whether the user has stayed, or will stay, at the villa
    pub async fn has_confirmed_booking(&self, user_id: Uuid, villa_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM bookings WHERE user_id = ? AND villa_id = ? AND status = 'CONFIRMED' LIMIT 1",
        )
        .bind(user_id)
        .bind(villa_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Move a booking from `from` to `to`
    ///
    /// Returns false when the booking is missing or no longer in `from`.
    pub async fn transition(&self, id: Uuid, from: BookingStatus, to: BookingStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(Utc::now())
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("Booking {} moved from {} to {}", id, from, to);
        }

        Ok(result.rows_affected() > 0)
    }

    /// Cancel a booking still in `booking.status` and settle its payment
    ///
    /// A completed payment is refunded in full and a pending one fails.
    /// Returns false, changing nothing, when the booking has moved on.
    pub async fn cancel(&self, booking: &Booking) -> Result<bool> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE bookings SET status = 'CANCELLED', updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(now)
        .bind(booking.id)
        .bind(booking.status.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let refunded = sqlx::query(
            "UPDATE payments SET status = 'REFUNDED', refund_amount = amount, updated_at = ? WHERE booking_id = ? AND status = 'COMPLETED'",
        )
        .bind(now)
        .bind(booking.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE payments SET status = 'FAILED', updated_at = ? WHERE booking_id = ? AND status = 'PENDING'",
        )
        .bind(now)
        .bind(booking.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if refunded.rows_affected() > 0 {
            info!("Refunded the payment of cancelled booking {}", booking.id);
        }
        info!("Booking {} moved from {} to CANCELLED", booking.id, booking.status);
        Ok(true)
    }

    /// Delete a booking and its payment
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts per status and the revenue of confirmed bookings
    pub async fn summary(&self) -> Result<BookingSummary> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS bookings, COALESCE(SUM(total_price), 0.0) AS revenue
            FROM bookings
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut summary = BookingSummary::default();
        for row in &rows {
            let status: String = row.try_get("status")?;
            let bookings: i64 = row.try_get("bookings")?;
            let revenue: f64 = row.try_get("revenue")?;

            summary.total_bookings += bookings;
            match status.parse::<BookingStatus>()? {
                BookingStatus::Pending => summary.pending_bookings += bookings,
                BookingStatus::Confirmed => {
                    summary.confirmed_bookings += bookings;
                    summary.total_revenue += revenue;
                }
                BookingStatus::Cancelled => summary.cancelled_bookings += bookings,
                BookingStatus::Failed => summary.failed_bookings += bookings,
            }
        }

        Ok(summary)
    }

    /// Fail every pending booking created before `cutoff`, with its pending payment
    ///
    /// Returns how many bookings were expired.
    pub async fn expire_pending(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = 'PENDING'"
        ))
        .fetch_all(&self.pool)
        .await?;

        let stale: Vec<Booking> = rows
            .iter()
            .map(booking_from_row)
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|booking| booking.created_at < cutoff)
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut expired = 0;
        let mut tx = self.pool.begin().await?;

        for booking in &stale {
            let result = sqlx::query(
                "UPDATE bookings SET status = 'FAILED', updated_at = ? WHERE id = ? AND status = 'PENDING'",
            )
            .bind(now)
            .bind(booking.id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                continue;
            }
            expired += 1;

            sqlx::query(
                "UPDATE payments SET status = 'FAILED', updated_at = ? WHERE booking_id = ? AND status = 'PENDING'",
            )
            .bind(now)
            .bind(booking.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        if expired > 0 {
            info!("Expired {} stale pending bookings", expired);
        }
        Ok(expired)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{models::CreateVilla, repositories::VillaRepository};
    use chrono::{Duration, NaiveDate};
    use common::database::init_memory_pool;

    pub(crate) fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(day(start), day(end)).unwrap()
    }

    pub(crate) async fn insert_user(pool: &SqlitePool, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (id, name, email, mobile, password_hash, role, active, created_at, updated_at) VALUES (?, ?, ?, ?, 'x', 'USER', 1, ?, ?)",
        )
        .bind(id)
        .bind(email.split('@').next().unwrap_or(email))
        .bind(email)
        .bind(id.simple().to_string())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn setup() -> (BookingRepository, Uuid, Uuid) {
        let pool = init_memory_pool().await.unwrap();
        let user = insert_user(&pool, "ada@example.com").await;
        let villa = VillaRepository::new(pool.clone())
            .create(&CreateVilla {
                name: "Casa Azul".to_string(),
                description: String::new(),
                address: "Goa".to_string(),
                price_per_night: 100.0,
                image_urls: vec![],
            })
            .await
            .unwrap();

        (BookingRepository::new(pool), user, villa.id)
    }

    fn created(outcome: NewBookingOutcome) -> Booking {
        match outcome {
            NewBookingOutcome::Created(booking) => booking,
            NewBookingOutcome::Overlaps(range) => panic!("unexpected overlap with {:?}", range),
        }
    }

    #[tokio::test]
    async fn overlapping_ranges_are_refused() {
        let (repo, user, villa) = setup().await;

        created(
            repo.create(user, villa, range("2030-01-10", "2030-01-15"), 500.0)
                .await
                .unwrap(),
        );

        let outcome = repo
            .create(user, villa, range("2030-01-14", "2030-01-16"), 200.0)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            NewBookingOutcome::Overlaps(range("2030-01-10", "2030-01-15"))
        );

        // Back-to-back stays share the changeover day.
        created(
            repo.create(user, villa, range("2030-01-15", "2030-01-17"), 200.0)
                .await
                .unwrap(),
        );
        assert_eq!(repo.active_for_villa(villa).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_bookings_release_their_dates() {
        let (repo, user, villa) = setup().await;
        let first = created(
            repo.create(user, villa, range("2030-01-10", "2030-01-15"), 500.0)
                .await
                .unwrap(),
        );

        assert!(
            repo.transition(first.id, BookingStatus::Pending, BookingStatus::Cancelled)
                .await
                .unwrap()
        );
        assert!(
            !repo
                .transition(first.id, BookingStatus::Pending, BookingStatus::Confirmed)
                .await
                .unwrap()
        );

        created(
            repo.create(user, villa, range("2030-01-12", "2030-01-14"), 200.0)
                .await
                .unwrap(),
        );
    }

    #[tokio::test]
    async fn summary_counts_statuses_and_confirmed_revenue() {
        let (repo, user, villa) = setup().await;
        let a = created(
            repo.create(user, villa, range("2030-01-01", "2030-01-03"), 200.0)
                .await
                .unwrap(),
        );
        let b = created(
            repo.create(user, villa, range("2030-02-01", "2030-02-04"), 300.0)
                .await
                .unwrap(),
        );
        created(
            repo.create(user, villa, range("2030-03-01", "2030-03-02"), 100.0)
                .await
                .unwrap(),
        );

        repo.transition(a.id, BookingStatus::Pending, BookingStatus::Confirmed)
            .await
            .unwrap();
        repo.transition(b.id, BookingStatus::Pending, BookingStatus::Failed)
            .await
            .unwrap();

        let summary = repo.summary().await.unwrap();
        assert_eq!(
            summary,
            BookingSummary {
                total_bookings: 3,
                pending_bookings: 1,
                confirmed_bookings: 1,
                cancelled_bookings: 0,
                failed_bookings: 1,
                total_revenue: 200.0,
            }
        );
    }

    #[tokio::test]
    async fn expiry_only_touches_old_pending_bookings() {
        let (repo, user, villa) = setup().await;
        let pending = created(
            repo.create(user, villa, range("2030-01-01", "2030-01-03"), 200.0)
                .await
                .unwrap(),
        );
        let confirmed = created(
            repo.create(user, villa, range("2030-02-01", "2030-02-03"), 200.0)
                .await
                .unwrap(),
        );
        repo.transition(confirmed.id, BookingStatus::Pending, BookingStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(repo.expire_pending(Utc::now() - Duration::hours(1)).await.unwrap(), 0);
        assert_eq!(repo.expire_pending(Utc::now() + Duration::seconds(1)).await.unwrap(), 1);

        let pending = repo.find_by_id(pending.id).await.unwrap().unwrap();
        let confirmed = repo.find_by_id(confirmed.id).await.unwrap().unwrap();
        assert_eq!(pending.status, BookingStatus::Failed);
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
    }
}

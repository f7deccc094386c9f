//! Scheduled expiry of abandoned pending bookings
//!
//! Creating a booking and paying for it are two separate requests. When a
//! guest never completes checkout the booking would hold its dates forever,
//! so a cron job fails every booking that stayed pending past its TTL.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::{config::ExpiryConfig, repositories::BookingRepository};

#[derive(Clone)]
pub struct PendingBookingSweeper {
    bookings: BookingRepository,
    ttl: chrono::Duration,
}

impl PendingBookingSweeper {
    pub fn new(bookings: BookingRepository, config: &ExpiryConfig) -> Self {
        let ttl_seconds = i64::try_from(config.pending_ttl_seconds).unwrap_or(i64::MAX);

        Self {
            bookings,
            ttl: chrono::Duration::try_seconds(ttl_seconds).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Expire bookings that were still pending at `now - ttl`
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = now.checked_sub_signed(self.ttl).unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.bookings.expire_pending(cutoff).await
    }

    /// Run [`sweep`](Self::sweep) on `schedule` until the returned scheduler is shut down
    pub async fn start(&self, schedule: &str) -> Result<JobScheduler> {
        let sweeper = self.clone();

        let scheduler = JobScheduler::new().await?;

        let job = Job::new_async(schedule, move |_, _| {
            let sweeper = sweeper.clone();
            Box::pin(async move {
                match sweeper.sweep(Utc::now()).await {
                    Ok(0) => {}
                    Ok(expired) => info!("Pending booking sweep expired {} bookings", expired),
                    Err(e) => error!("Pending booking sweep failed: {:#}", e),
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Started pending booking sweeper with schedule: {}", schedule);
        Ok(scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::CreateVilla,
        repositories::{NewBookingOutcome, VillaRepository, booking::tests::insert_user},
    };
    use common::{BookingStatus, DateRange, database::init_memory_pool};

    #[tokio::test]
    async fn sweep_respects_the_ttl() {
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
        let bookings = BookingRepository::new(pool);
        let range = DateRange::new(
            chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2030, 1, 3).unwrap(),
        )
        .unwrap();
        let NewBookingOutcome::Created(booking) =
            bookings.create(user, villa.id, range, 200.0).await.unwrap()
        else {
            panic!("booking should not overlap");
        };

        let sweeper = PendingBookingSweeper::new(
            bookings.clone(),
            &ExpiryConfig {
                pending_ttl_seconds: 900,
                schedule: ExpiryConfig::default().schedule,
            },
        );

        assert_eq!(sweeper.sweep(Utc::now()).await.unwrap(), 0);
        assert_eq!(
            sweeper
                .sweep(Utc::now() + chrono::Duration::seconds(901))
                .await
                .unwrap(),
            1
        );

        let stored = bookings.find_by_id(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Failed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn scheduler_starts_with_the_default_schedule() {
        let pool = init_memory_pool().await.unwrap();
        let sweeper =
            PendingBookingSweeper::new(BookingRepository::new(pool), &ExpiryConfig::default());

        let mut scheduler = sweeper.start(&ExpiryConfig::default().schedule).await.unwrap();
        scheduler.shutdown().await.unwrap();
    }
}

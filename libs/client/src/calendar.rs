//! Date picker support for a villa's booking calendar

use chrono::NaiveDate;
use common::{Availability, BookingStatus, DateRange};
use uuid::Uuid;

use crate::{api::ApiClient, error::ClientResult, models::Booking};

/// Disabled dates of one villa as seen on `today`
#[derive(Debug, Clone)]
pub struct BookingCalendar {
    availability: Availability,
    today: NaiveDate,
}

impl BookingCalendar {
    pub fn from_bookings(bookings: &[Booking], today: NaiveDate) -> Self {
        Self {
            availability: Availability::from_reservations(bookings),
            today,
        }
    }

    /// Calendar over intervals the API already reduced to active holds
    pub fn from_ranges(ranges: &[DateRange], today: NaiveDate) -> Self {
        let held: Vec<_> = ranges
            .iter()
            .map(|range| (range.start, range.end, BookingStatus::Confirmed))
            .collect();

        Self {
            availability: Availability::from_reservations(&held),
            today,
        }
    }

    /// Load the held intervals of `villa_id` through the API
    pub async fn fetch(api: &ApiClient, villa_id: Uuid, today: NaiveDate) -> ClientResult<Self> {
        let availability = api.villa_availability(villa_id).await?;
        Ok(Self::from_ranges(&availability.booked, today))
    }

    pub fn is_disabled(&self, date: NaiveDate) -> bool {
        self.availability.is_blocked(date, self.today)
    }

    /// Whether the picker should accept `[check_in, check_out)`
    pub fn can_book(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        match DateRange::new(check_in, check_out) {
            Some(range) => check_in >= self.today && self.availability.range_is_free(&range),
            None => false,
        }
    }

    pub fn disabled_dates(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        self.availability.blocked_dates(from, to, self.today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn booking(check_in: &str, check_out: &str, status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            villa_id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            check_in: day(check_in),
            check_out: day(check_out),
            total_price: 0.0,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn disables_booked_and_past_dates() {
        let bookings = vec![
            booking("2024-01-10", "2024-01-15", BookingStatus::Confirmed),
            booking("2024-02-01", "2024-02-05", BookingStatus::Pending),
            booking("2024-01-18", "2024-01-22", BookingStatus::Cancelled),
        ];
        let calendar = BookingCalendar::from_bookings(&bookings, day("2024-01-05"));

        assert!(calendar.is_disabled(day("2024-01-12")));
        assert!(calendar.is_disabled(day("2024-02-01")));
        assert!(calendar.is_disabled(day("2024-01-04")));
        assert!(!calendar.is_disabled(day("2024-01-15")));
        assert!(!calendar.is_disabled(day("2024-01-20")));
    }

    #[test]
    fn accepts_turnover_days_only() {
        let ranges = [DateRange::new(day("2024-01-10"), day("2024-01-15")).unwrap()];
        let calendar = BookingCalendar::from_ranges(&ranges, day("2024-01-01"));

        assert!(calendar.can_book(day("2024-01-15"), day("2024-01-17")));
        assert!(calendar.can_book(day("2024-01-07"), day("2024-01-10")));
        assert!(!calendar.can_book(day("2024-01-14"), day("2024-01-16")));
        assert!(!calendar.can_book(day("2024-01-20"), day("2024-01-20")));
        assert!(!BookingCalendar::from_ranges(&ranges, day("2024-01-08"))
            .can_book(day("2024-01-07"), day("2024-01-09")));
        assert_eq!(
            calendar.disabled_dates(day("2024-01-13"), day("2024-01-16")),
            vec![day("2024-01-13"), day("2024-01-14")]
        );
    }
}

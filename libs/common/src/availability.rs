//! Availability calculator
//!
//! Derives the blocked calendar dates of a villa from its reservations. Every
//! reservation blocks the half-open interval `[check_in, check_out)`, so the
//! check-out day of one stay is free to be the check-in day of the next.
//! Cancelled and failed reservations block nothing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::booking::BookingStatus;

/// Half-open range of nights `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, or `None` when it would not contain a single night
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Anything that holds a villa for a date range
pub trait Reservation {
    fn check_in(&self) -> NaiveDate;
    fn check_out(&self) -> NaiveDate;
    fn status(&self) -> BookingStatus;
}

impl Reservation for (NaiveDate, NaiveDate, BookingStatus) {
    fn check_in(&self) -> NaiveDate {
        self.0
    }

    fn check_out(&self) -> NaiveDate {
        self.1
    }

    fn status(&self) -> BookingStatus {
        self.2
    }
}

/// Blocked intervals of one villa
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    intervals: Vec<DateRange>,
}

impl Availability {
    /// Collect the intervals held by active reservations, ordered by start
    pub fn from_reservations<'a, R, I>(reservations: I) -> Self
    where
        R: Reservation + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let mut intervals: Vec<DateRange> = reservations
            .into_iter()
            .filter(|r| r.status().is_active())
            .filter_map(|r| DateRange::new(r.check_in(), r.check_out()))
            .collect();
        intervals.sort();

        Self { intervals }
    }

    pub fn intervals(&self) -> &[DateRange] {
        &self.intervals
    }

    /// Whether some reservation holds the night of `date`
    pub fn is_booked(&self, date: NaiveDate) -> bool {
        self.intervals.iter().any(|range| range.contains(date))
    }

    /// Whether `date` must be disabled in a calendar shown on `today`
    pub fn is_blocked(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date < today || self.is_booked(date)
    }

    /// First held interval that collides with `range`
    pub fn first_conflict(&self, range: &DateRange) -> Option<DateRange> {
        self.intervals
            .iter()
            .find(|held| held.overlaps(range))
            .copied()
    }

    pub fn range_is_free(&self, range: &DateRange) -> bool {
        self.first_conflict(range).is_none()
    }

    /// Every blocked date in `[from, to)`, for rendering a calendar page
    pub fn blocked_dates(&self, from: NaiveDate, to: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
        from.iter_days()
            .take_while(|date| *date < to)
            .filter(|date| self.is_blocked(*date, today))
            .collect()
    }
}

//! Shared test helpers for `slotline-core` integration tests.
//!
//! [`Portal`] simulates a booking portal with a rolling horizon so tests can
//! describe scenarios in terms of days and bookings instead of hand-written
//! slot sets.

#![allow(dead_code)]

use std::ops::RangeInclusive;

use chrono::{DateTime, Duration, TimeZone, Utc};
use slotline_domain::{PairKey, RawObservation};

/// Midnight UTC starting day `day` of January 2024 (later days roll over)
pub fn day_start(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(i64::from(day) - 1)
}

/// The daily 06:00 UTC grab
pub fn grab_at(day: u32) -> DateTime<Utc> {
    day_start(day) + Duration::hours(6)
}

/// Appointment at `hour`:00 on `day`. January is GMT, so UTC equals
/// portal-local time.
pub fn slot_at(day: u32, hour: u32) -> DateTime<Utc> {
    day_start(day) + Duration::hours(i64::from(hour))
}

#[derive(Debug, Clone)]
struct Booking {
    appointment: DateTime<Utc>,
    from: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
}

/// Simulated portal listing every unbooked slot up to `horizon_days` ahead
#[derive(Debug, Clone)]
pub struct Portal {
    pub pair: PairKey,
    pub horizon_days: u32,
    pub hours: Vec<u32>,
    bookings: Vec<Booking>,
}

impl Portal {
    pub fn new(center: &str, test: &str, horizon_days: u32, hours: &[u32]) -> Self {
        Self { pair: PairKey::new(center, test), horizon_days, hours: hours.to_vec(), bookings: Vec::new() }
    }

    /// Hide `appointment` from the start of `from_day` until the start of
    /// `until_day` (forever when `None`)
    pub fn book(mut self, appointment: DateTime<Utc>, from_day: u32, until_day: Option<u32>) -> Self {
        self.bookings.push(Booking {
            appointment,
            from: day_start(from_day),
            until: until_day.map(day_start),
        });
        self
    }

    /// Book a deterministic pseudo-random share of slots on `dates`
    pub fn churn(mut self, dates: RangeInclusive<u32>, seed: u64) -> Self {
        let mut state = seed;
        for date in dates {
            for hour in self.hours.clone() {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
                let roll = state >> 33;
                if roll % 3 != 0 {
                    continue;
                }
                let lead = (roll / 3 % u64::from(self.horizon_days)) as u32;
                let from_day = date.saturating_sub(lead).max(1);
                let until_day = (roll % 5 == 0).then_some(from_day + 1 + (roll % 2) as u32);
                self = self.book(slot_at(date, hour), from_day, until_day);
            }
        }
        self
    }

    fn is_booked(&self, appointment: DateTime<Utc>, grab: DateTime<Utc>) -> bool {
        self.bookings.iter().any(|booking| {
            booking.appointment == appointment
                && grab >= booking.from
                && booking.until.map_or(true, |until| grab < until)
        })
    }

    /// Snapshot at an arbitrary grab time
    pub fn snapshot(&self, grab: DateTime<Utc>) -> RawObservation {
        let first = (grab - day_start(1)).num_days() as u32 + 1;
        let listed: Vec<DateTime<Utc>> = (first..=first + self.horizon_days)
            .flat_map(|date| self.hours.iter().map(move |hour| slot_at(date, *hour)))
            .filter(|appointment| *appointment >= grab && !self.is_booked(*appointment, grab))
            .collect();
        RawObservation::new(grab, self.pair.center.as_str(), self.pair.test.as_str(), listed)
    }

    /// One 06:00 snapshot per day
    pub fn observe(&self, days: RangeInclusive<u32>) -> Vec<RawObservation> {
        days.map(|day| self.snapshot(grab_at(day))).collect()
    }

    /// Snapshots at irregular times: `(day, hour)` pairs
    pub fn observe_at(&self, grabs: &[(u32, u32)]) -> Vec<RawObservation> {
        grabs.iter().map(|(day, hour)| self.snapshot(day_start(*day) + Duration::hours(i64::from(*hour)))).collect()
    }
}

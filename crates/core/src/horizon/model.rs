//! Horizon model
//!
//! Estimates, per pair, how far ahead the portal lists appointments. The
//! portal opens a new appointment date at local midnight, so first
//! appearances cluster on the day a date opens. The distance between that
//! day and the opened date is the horizon advance.
//!
//! # Algorithm
//! 1. Record each slot's first-seen grab (only grabs at or before the
//!    appointment count).
//! 2. Lead times `appointment - first_seen` give `min_lead_days` and
//!    `max_lead_days`.
//! 3. For each appointment date, the earliest grab listing any slot on that
//!    date is its posting. Postings on the first observation day are
//!    censored.
//! 4. The horizon advance is the most frequent `date - posting day` among
//!    uncensored postings, ties going to the larger value. With no
//!    uncensored posting it falls back to the largest date lead seen and the
//!    estimate is low-confidence.
//! 5. Days (other than the first) on which at least `burst_min_slots`
//!    slots first appeared are reported as horizon advances.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use slotline_domain::constants::SECONDS_PER_DAY;
use slotline_domain::{
    Confidence, FirstAppearance, FirstPosting, HorizonAdvance, HorizonConfig, HorizonEstimate,
    LowConfidenceReason, Observation, PairKey, SlotlineError,
};
use tracing::debug;

use super::calendar::PortalCalendar;

#[derive(Debug, Clone)]
pub struct HorizonModel {
    config: HorizonConfig,
    calendar: PortalCalendar,
}

impl HorizonModel {
    pub fn new(config: HorizonConfig, calendar: PortalCalendar) -> Self {
        Self { config, calendar }
    }

    pub fn calendar(&self) -> &PortalCalendar {
        &self.calendar
    }

    /// Estimate the booking horizon of `pair` from its time-ordered
    /// observations
    ///
    /// Pure: the same observations always give the same estimate.
    pub fn estimate(&self, pair: &PairKey, observations: &[Observation]) -> HorizonEstimate {
        let first_seen = first_seen(observations);

        let (min_lead_days, max_lead_days) = first_seen
            .iter()
            .map(|(appointment, grab)| lead_days(*appointment, *grab))
            .fold(None, |acc: Option<(f64, f64)>, lead| match acc {
                None => Some((lead, lead)),
                Some((lo, hi)) => Some((lo.min(lead), hi.max(lead))),
            })
            .unwrap_or((0.0, 0.0));

        let first_day = observations.first().map(|observation| self.calendar.local_date(observation.grab));
        let postings = self.postings(&first_seen, first_day);

        let mut reasons = Vec::new();
        if first_seen.len() < self.config.min_distinct_slots {
            reasons.push(LowConfidenceReason::TooFewSlots {
                observed: first_seen.len(),
                required: self.config.min_distinct_slots,
            });
        }
        if observations.len() < self.config.min_observations {
            reasons.push(LowConfidenceReason::TooFewObservations {
                observed: observations.len(),
                required: self.config.min_observations,
            });
        }

        let horizon_advance_days = match modal_lead(&postings) {
            Some(lead) => lead,
            None => {
                reasons.push(LowConfidenceReason::NoHorizonAdvanceObserved);
                first_seen
                    .iter()
                    .map(|(appointment, grab)| self.calendar.date_lead(*appointment, *grab))
                    .max()
                    .unwrap_or(0)
            }
        };

        let advances = self.advances(&first_seen, first_day);
        let confidence =
            if reasons.is_empty() { Confidence::Normal } else { Confidence::Low { reasons } };

        debug!(
            pair = %pair,
            distinct_slots = first_seen.len(),
            observations = observations.len(),
            horizon_advance_days,
            min_lead_days,
            max_lead_days,
            low_confidence = confidence.is_low(),
            "horizon estimated"
        );

        let first_appearances = first_seen
            .iter()
            .map(|(appointment, grab)| FirstAppearance {
                appointment: *appointment,
                first_grab: *grab,
                lead_days: lead_days(*appointment, *grab),
            })
            .collect();

        HorizonEstimate {
            pair: pair.clone(),
            min_lead_days,
            max_lead_days,
            horizon_advance_days,
            confidence,
            distinct_slots: first_seen.len(),
            observations: observations.len(),
            advances,
            postings,
            first_appearances,
        }
    }

    fn postings(
        &self,
        first_seen: &BTreeMap<DateTime<Utc>, DateTime<Utc>>,
        first_day: Option<NaiveDate>,
    ) -> Vec<FirstPosting> {
        let mut by_date: BTreeMap<NaiveDate, DateTime<Utc>> = BTreeMap::new();
        for (appointment, grab) in first_seen {
            let earliest = by_date.entry(self.calendar.local_date(*appointment)).or_insert(*grab);
            if grab < earliest {
                *earliest = *grab;
            }
        }

        by_date
            .into_iter()
            .map(|(appointment_date, first_grab)| {
                let posting_day = self.calendar.local_date(first_grab);
                FirstPosting {
                    appointment_date,
                    first_grab,
                    posting_day,
                    lead_days: (appointment_date - posting_day).num_days(),
                    censored: Some(posting_day) == first_day,
                }
            })
            .collect()
    }

    fn advances(
        &self,
        first_seen: &BTreeMap<DateTime<Utc>, DateTime<Utc>>,
        first_day: Option<NaiveDate>,
    ) -> Vec<HorizonAdvance> {
        let mut by_day: BTreeMap<NaiveDate, (usize, NaiveDate)> = BTreeMap::new();
        for (appointment, grab) in first_seen {
            let day = self.calendar.local_date(*grab);
            let date = self.calendar.local_date(*appointment);
            let entry = by_day.entry(day).or_insert((0, date));
            entry.0 += 1;
            entry.1 = entry.1.max(date);
        }

        by_day
            .into_iter()
            .filter(|(day, (count, _))| {
                Some(*day) != first_day && *count >= self.config.burst_min_slots
            })
            .map(|(day, (newly_listed, opened_date))| HorizonAdvance {
                day,
                newly_listed,
                opened_date,
            })
            .collect()
    }
}

/// Report a low-confidence estimate as insufficient data
///
/// Only too few slots or observations count; a missing horizon advance is
/// a property of the observation window, not of data volume.
pub fn insufficiency(estimate: &HorizonEstimate) -> Option<SlotlineError> {
    let reasons: Vec<String> = estimate
        .confidence
        .reasons()
        .iter()
        .filter(|reason| !matches!(reason, LowConfidenceReason::NoHorizonAdvanceObserved))
        .map(ToString::to_string)
        .collect();

    if reasons.is_empty() {
        None
    } else {
        Some(SlotlineError::insufficient(estimate.pair.clone(), reasons.join("; ")))
    }
}

/// Appointment time to the first grab at or before it that listed the slot
fn first_seen(observations: &[Observation]) -> BTreeMap<DateTime<Utc>, DateTime<Utc>> {
    let mut seen = BTreeMap::new();
    for observation in observations {
        for appointment in observation.available.range(observation.grab..) {
            seen.entry(*appointment).or_insert(observation.grab);
        }
    }
    seen
}

// Lead times stay far below 2^53 seconds.
#[allow(clippy::cast_precision_loss)]
fn lead_days(appointment: DateTime<Utc>, grab: DateTime<Utc>) -> f64 {
    (appointment - grab).num_seconds() as f64 / SECONDS_PER_DAY
}

fn modal_lead(postings: &[FirstPosting]) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for posting in postings.iter().filter(|posting| !posting.censored) {
        *counts.entry(posting.lead_days).or_default() += 1;
    }
    counts.into_iter().max_by_key(|(lead, count)| (*count, *lead)).map(|(lead, _)| lead)
}

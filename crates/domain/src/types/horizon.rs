//! Per-pair booking-horizon estimates

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::slot::PairKey;

/// Why an estimate is not trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LowConfidenceReason {
    TooFewSlots { observed: usize, required: usize },
    TooFewObservations { observed: usize, required: usize },
    /// Every appointment date was already open when observation began
    NoHorizonAdvanceObserved,
}

impl fmt::Display for LowConfidenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewSlots { observed, required } => {
                write!(f, "{observed} distinct slots observed, {required} required")
            }
            Self::TooFewObservations { observed, required } => {
                write!(f, "{observed} observations, {required} required")
            }
            Self::NoHorizonAdvanceObserved => write!(f, "no horizon advance observed"),
        }
    }
}

/// Confidence of a horizon estimate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum Confidence {
    Normal,
    Low { reasons: Vec<LowConfidenceReason> },
}

impl Confidence {
    pub fn is_low(&self) -> bool {
        matches!(self, Self::Low { .. })
    }

    pub fn reasons(&self) -> &[LowConfidenceReason] {
        match self {
            Self::Normal => &[],
            Self::Low { reasons } => reasons,
        }
    }
}

/// A calendar day on which many slots appeared at once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonAdvance {
    /// Portal-local day of the burst
    pub day: NaiveDate,
    pub newly_listed: usize,
    /// Latest appointment date among the newly listed slots
    pub opened_date: NaiveDate,
}

/// First grab that listed one slot, at or before its appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstAppearance {
    pub appointment: DateTime<Utc>,
    pub first_grab: DateTime<Utc>,
    /// `appointment - first_grab` in days
    pub lead_days: f64,
}

/// First time any slot on a given appointment date was listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstPosting {
    pub appointment_date: NaiveDate,
    pub first_grab: DateTime<Utc>,
    pub posting_day: NaiveDate,
    /// `appointment_date - posting_day` in whole days
    pub lead_days: i64,
    /// Posted on the pair's first observation day, so the date may have
    /// opened earlier
    pub censored: bool,
}

/// Booking-horizon estimate for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonEstimate {
    pub pair: PairKey,
    /// Smallest `appointment - first_seen` across slots, in days
    pub min_lead_days: f64,
    /// Largest `appointment - first_seen` across slots, in days
    pub max_lead_days: f64,
    /// Calendar days between a grab's local date and the furthest date that
    /// can be listed
    pub horizon_advance_days: i64,
    pub confidence: Confidence,
    pub distinct_slots: usize,
    pub observations: usize,
    pub advances: Vec<HorizonAdvance>,
    pub postings: Vec<FirstPosting>,
    /// One entry per distinct slot, ordered by appointment
    pub first_appearances: Vec<FirstAppearance>,
}

impl HorizonEstimate {
    pub fn is_low_confidence(&self) -> bool {
        self.confidence.is_low()
    }

    /// Furthest appointment date that can be listed on `day`
    pub fn edge_date(&self, day: NaiveDate) -> NaiveDate {
        day.checked_add_signed(Duration::days(self.horizon_advance_days)).unwrap_or(NaiveDate::MAX)
    }
}

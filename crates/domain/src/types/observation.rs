//! Availability snapshots
//!
//! A [`RawObservation`] is what an upstream collaborator hands over: every
//! field may be missing. [`Observation`] is the validated form the store
//! keeps.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SlotlineError;
use crate::types::slot::{CenterId, PairKey, TestType};

/// One listed slot inside a raw observation
///
/// `center_id` and `test_type` are optional; when present they must agree
/// with the enclosing observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSlot {
    pub appointment: Option<DateTime<Utc>>,
    #[serde(default)]
    pub center_id: Option<String>,
    #[serde(default)]
    pub test_type: Option<String>,
}

impl RawSlot {
    pub fn at(appointment: DateTime<Utc>) -> Self {
        Self { appointment: Some(appointment), ..Self::default() }
    }
}

/// Unvalidated snapshot of the slots listed for one pair at one grab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObservation {
    pub grab: Option<DateTime<Utc>>,
    pub center_id: Option<String>,
    pub test_type: Option<String>,
    /// `None` means the field was missing; an empty list is a valid snapshot
    /// in which nothing was available.
    pub slots: Option<Vec<RawSlot>>,
}

impl RawObservation {
    /// Convenience constructor for a complete observation
    pub fn new(
        grab: DateTime<Utc>,
        center_id: impl Into<String>,
        test_type: impl Into<String>,
        appointments: impl IntoIterator<Item = DateTime<Utc>>,
    ) -> Self {
        Self {
            grab: Some(grab),
            center_id: Some(center_id.into()),
            test_type: Some(test_type.into()),
            slots: Some(appointments.into_iter().map(RawSlot::at).collect()),
        }
    }
}

/// Validated snapshot: the set of appointment times listed as available for
/// one pair at one grab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub grab: DateTime<Utc>,
    pub pair: PairKey,
    pub available: BTreeSet<DateTime<Utc>>,
}

impl Observation {
    pub fn new(
        grab: DateTime<Utc>,
        pair: PairKey,
        available: impl IntoIterator<Item = DateTime<Utc>>,
    ) -> Self {
        Self { grab, pair, available: available.into_iter().collect() }
    }

    /// Whether the slot at `appointment` was listed in this snapshot
    pub fn lists(&self, appointment: &DateTime<Utc>) -> bool {
        self.available.contains(appointment)
    }
}

fn required(field: Option<String>, name: &str) -> Result<String, SlotlineError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(SlotlineError::malformed(format!("{name} is blank"))),
        None => Err(SlotlineError::malformed(format!("{name} is missing"))),
    }
}

impl TryFrom<RawObservation> for Observation {
    type Error = SlotlineError;

    fn try_from(raw: RawObservation) -> Result<Self, Self::Error> {
        let grab = raw.grab.ok_or_else(|| SlotlineError::malformed("grab timestamp is missing"))?;
        let center = required(raw.center_id, "center id")?;
        let test = required(raw.test_type, "test type")?;
        let slots = raw.slots.ok_or_else(|| SlotlineError::malformed("slot set is missing"))?;

        let mut available = BTreeSet::new();
        for (index, slot) in slots.into_iter().enumerate() {
            let appointment = slot.appointment.ok_or_else(|| {
                SlotlineError::malformed(format!("slot {index} has no appointment timestamp"))
            })?;
            if let Some(other) = slot.center_id.as_deref() {
                if other != center {
                    return Err(SlotlineError::malformed(format!(
                        "slot {index} belongs to center {other}, observation is for {center}"
                    )));
                }
            }
            if let Some(other) = slot.test_type.as_deref() {
                if other != test {
                    return Err(SlotlineError::malformed(format!(
                        "slot {index} is for test {other}, observation is for {test}"
                    )));
                }
            }
            available.insert(appointment);
        }

        Ok(Self {
            grab,
            pair: PairKey { center: CenterId::new(center), test: TestType::new(test) },
            available,
        })
    }
}

//! Reconstructed slot timelines
//!
//! A [`SlotTimeline`] is built once per run by the reconstructor and never
//! mutated afterwards. Segments are half-open `[start, end)` intervals in
//! grab time; transitions carry the open interval `(after, before)` in which
//! the change happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::slot::SlotId;

/// Status of a timeline segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Available,
    Booked,
    OutOfHorizon,
    /// In horizon but not seen yet, or absent for an ambiguous reason
    Unknown,
}

crate::impl_domain_status_conversions!(SegmentStatus {
    Available => "available",
    Booked => "booked",
    OutOfHorizon => "out_of_horizon",
    Unknown => "unknown",
});

/// Reconstructor state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Unseen,
    Available,
    Booked,
    /// Disappeared near the horizon edge; booking not asserted
    Ambiguous,
    OutOfHorizon,
    FinalBooked,
    FinalUnused,
    FinalUnresolved,
}

crate::impl_domain_status_conversions!(SlotState {
    Unseen => "unseen",
    Available => "available",
    Booked => "booked",
    Ambiguous => "ambiguous",
    OutOfHorizon => "out_of_horizon",
    FinalBooked => "final_booked",
    FinalUnused => "final_unused",
    FinalUnresolved => "final_unresolved",
});

impl SlotState {
    /// Terminal states are reached once and never left
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::FinalBooked | Self::FinalUnused | Self::FinalUnresolved)
    }
}

/// Outcome of a settled slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Booked,
    Unused,
    Unresolved,
}

crate::impl_domain_status_conversions!(FinalStatus {
    Booked => "booked",
    Unused => "unused",
    Unresolved => "unresolved",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// available -> booked
    Booking,
    /// booked -> available
    Cancellation,
}

crate::impl_domain_status_conversions!(TransitionKind {
    Booking => "booking",
    Cancellation => "cancellation",
});

/// A state change known to have happened strictly between two grabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: TransitionKind,
    /// Last grab in the old status
    pub after: DateTime<Utc>,
    /// First grab in the new status
    pub before: DateTime<Utc>,
}

impl Transition {
    /// Point estimate of when the change happened
    pub fn midpoint(&self) -> DateTime<Utc> {
        self.after + (self.before - self.after) / 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub status: SegmentStatus,
    pub start: DateTime<Utc>,
    /// `None` while the segment is still open
    pub end: Option<DateTime<Utc>>,
    pub ambiguous: bool,
}

/// Derived history of one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTimeline {
    pub slot: SlotId,
    pub segments: Vec<Segment>,
    pub transitions: Vec<Transition>,
    pub state: SlotState,
    /// Set when the history was flagged inconsistent
    pub partial: bool,
    /// Last grab of the pair, which decides whether the slot is settled
    pub last_grab: DateTime<Utc>,
}

impl SlotTimeline {
    pub fn final_status(&self) -> Option<FinalStatus> {
        match self.state {
            SlotState::FinalBooked => Some(FinalStatus::Booked),
            SlotState::FinalUnused => Some(FinalStatus::Unused),
            SlotState::FinalUnresolved => Some(FinalStatus::Unresolved),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.state.is_final()
    }

    /// Status of the last segment
    pub fn current_status(&self) -> Option<SegmentStatus> {
        self.segments.last().map(|segment| segment.status)
    }

    pub fn final_status_record(&self) -> Option<FinalStatusRecord> {
        self.final_status().map(|final_status| FinalStatusRecord {
            slot: self.slot.clone(),
            last_grab: self.last_grab,
            final_status,
        })
    }

    /// Tabular rendering, one row per segment
    pub fn rows(&self) -> Vec<TimelineRow> {
        let slot_id = self.slot.to_string();
        self.segments
            .iter()
            .map(|segment| TimelineRow {
                slot_id: slot_id.clone(),
                center_id: self.slot.center.to_string(),
                test_type: self.slot.test.to_string(),
                appointment: self.slot.appointment,
                status: segment.status,
                segment_start: segment.start,
                segment_end: segment.end,
                is_ambiguous: segment.ambiguous,
            })
            .collect()
    }
}

/// Serialized tabular form of one timeline segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub slot_id: String,
    pub center_id: String,
    pub test_type: String,
    pub appointment: DateTime<Utc>,
    pub status: SegmentStatus,
    pub segment_start: DateTime<Utc>,
    pub segment_end: Option<DateTime<Utc>>,
    pub is_ambiguous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Book,
    Cancel,
}

crate::impl_domain_status_conversions!(ActivityAction {
    Book => "book",
    Cancel => "cancel",
});

impl From<TransitionKind> for ActivityAction {
    fn from(kind: TransitionKind) -> Self {
        match kind {
            TransitionKind::Booking => Self::Book,
            TransitionKind::Cancellation => Self::Cancel,
        }
    }
}

/// One inferred booking or cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub slot: SlotId,
    pub action: ActivityAction,
    /// Grab before the change
    pub previous_grab: DateTime<Utc>,
    /// Grab at which the change was first visible
    pub grab: DateTime<Utc>,
}

/// Final outcome of a settled slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStatusRecord {
    pub slot: SlotId,
    pub last_grab: DateTime<Utc>,
    pub final_status: FinalStatus,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, 0, 0).unwrap()
    }

    fn timeline(state: SlotState) -> SlotTimeline {
        SlotTimeline {
            slot: SlotId::new("C1", "blood", at(20)),
            segments: vec![
                Segment { status: SegmentStatus::Available, start: at(6), end: Some(at(10)), ambiguous: false },
                Segment { status: SegmentStatus::Booked, start: at(10), end: Some(at(20)), ambiguous: false },
            ],
            transitions: vec![Transition { kind: TransitionKind::Booking, after: at(8), before: at(10) }],
            state,
            partial: false,
            last_grab: at(22),
        }
    }

    #[test]
    fn test_transition_midpoint() {
        let t = Transition { kind: TransitionKind::Booking, after: at(8), before: at(11) };
        assert_eq!(t.midpoint(), at(9) + Duration::minutes(30));
    }

    #[test]
    fn test_final_status_only_for_final_states() {
        assert_eq!(timeline(SlotState::FinalBooked).final_status(), Some(FinalStatus::Booked));
        assert_eq!(timeline(SlotState::Booked).final_status(), None);
        assert!(timeline(SlotState::Booked).final_status_record().is_none());

        let record = timeline(SlotState::FinalBooked).final_status_record().unwrap();
        assert_eq!(record.last_grab, at(22));
    }

    #[test]
    fn test_rows_render_one_per_segment() {
        let rows = timeline(SlotState::FinalBooked).rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].slot_id, "C1/blood/2024-06-03T20:00:00Z");
        assert_eq!(rows[1].status, SegmentStatus::Booked);
        assert_eq!(rows[1].segment_end, Some(at(20)));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(SegmentStatus::OutOfHorizon.to_string(), "out_of_horizon");
        assert_eq!("FINAL_UNUSED".parse::<SlotState>(), Ok(SlotState::FinalUnused));
        assert_eq!(ActivityAction::from(TransitionKind::Cancellation), ActivityAction::Cancel);
        assert!(SlotState::FinalUnresolved.is_final());
        assert!(!SlotState::Ambiguous.is_final());
    }
}

//! Booking activity and final status tables derived from timelines

use slotline_domain::{ActivityRecord, FinalStatusRecord, SlotTimeline};

/// Every inferred booking and cancellation, grouped by slot and ordered by
/// time within each slot
pub fn activity<'a>(timelines: impl IntoIterator<Item = &'a SlotTimeline>) -> Vec<ActivityRecord> {
    timelines
        .into_iter()
        .flat_map(|timeline| {
            timeline.transitions.iter().map(move |transition| ActivityRecord {
                slot: timeline.slot.clone(),
                action: transition.kind.into(),
                previous_grab: transition.after,
                grab: transition.before,
            })
        })
        .collect()
}

/// Final status of every settled slot
pub fn final_statuses<'a>(
    timelines: impl IntoIterator<Item = &'a SlotTimeline>,
) -> Vec<FinalStatusRecord> {
    timelines.into_iter().filter_map(SlotTimeline::final_status_record).collect()
}

//! History reconstructor
//!
//! Walks a pair's observations in grab order once per slot and derives the
//! slot's timeline. The walk is a pure function of the observations, the
//! pair's horizon estimate and the configuration.
//!
//! # Rules
//! - Only grabs at or before the appointment drive the walk.
//! - Listed → `Available`. Listed again after `Booked` is a cancellation.
//! - Not listed after `Available` → `Booked`, unless the date lead still
//!   lies inside the ambiguity window below the horizon edge, in which case
//!   the slot becomes `Ambiguous` and no booking is recorded.
//! - Not listed before the first sighting → `OutOfHorizon` when the date lies
//!   beyond the horizon edge, otherwise `Unseen`.
//! - Once the pair has been observed at or after the appointment the slot is
//!   settled and its state becomes final.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use slotline_domain::{
    HorizonEstimate, Observation, PairKey, ReconstructionConfig, Segment, SegmentStatus,
    SlotId, SlotState, SlotTimeline, SlotlineError, Transition, TransitionKind,
};

use crate::horizon::PortalCalendar;

/// Timeline of one slot plus the consistency problem found, if any
#[derive(Debug)]
pub struct SlotOutcome {
    pub timeline: SlotTimeline,
    pub issue: Option<SlotlineError>,
}

#[derive(Debug, Clone)]
pub struct HistoryReconstructor {
    config: ReconstructionConfig,
    calendar: PortalCalendar,
}

impl HistoryReconstructor {
    pub fn new(config: ReconstructionConfig, calendar: PortalCalendar) -> Self {
        Self { config, calendar }
    }

    /// Reconstruct every slot ever listed for `pair`, in appointment order
    pub fn reconstruct_pair(
        &self,
        pair: &PairKey,
        observations: &[Observation],
        estimate: &HorizonEstimate,
    ) -> Vec<SlotOutcome> {
        let Some(last_grab) = observations.last().map(|observation| observation.grab) else {
            return Vec::new();
        };
        let cycle = observation_cycle(observations);

        let appointments: BTreeSet<DateTime<Utc>> = observations
            .iter()
            .flat_map(|observation| observation.available.iter().copied())
            .collect();

        appointments
            .into_iter()
            .filter(|appointment| !self.config.past_appointments_only || *appointment <= last_grab)
            .map(|appointment| {
                let slot = SlotId::in_pair(pair, appointment);
                self.reconstruct_slot(&slot, observations, estimate, cycle)
            })
            .collect()
    }

    /// Reconstruct one slot from its pair's time-ordered observations
    pub fn reconstruct_slot(
        &self,
        slot: &SlotId,
        observations: &[Observation],
        estimate: &HorizonEstimate,
        cycle: Option<Duration>,
    ) -> SlotOutcome {
        let appointment = slot.appointment;
        let walked = observations.partition_point(|observation| observation.grab <= appointment);

        let mut walk = SlotWalk {
            calendar: &self.calendar,
            appointment,
            horizon_advance: estimate.horizon_advance_days,
            window: self.window_days(estimate),
            state: SlotState::Unseen,
            segments: Vec::new(),
            transitions: Vec::new(),
            prev_grab: None,
            max_seen_lead: None,
        };
        for observation in &observations[..walked] {
            walk.step(observation);
        }

        let last_grab = observations.last().map_or(appointment, |observation| observation.grab);
        let issue = self.check_consistency(slot, observations, walked, cycle);
        let (segments, transitions, state) = walk.finish(last_grab >= appointment);

        SlotOutcome {
            timeline: SlotTimeline {
                slot: slot.clone(),
                segments,
                transitions,
                state,
                partial: issue.is_some(),
                last_grab,
            },
            issue,
        }
    }

    /// Days below the horizon edge in which a disappearance is ambiguous
    // Lead days are non-negative and bounded by the observation span.
    #[allow(clippy::cast_possible_truncation)]
    fn window_days(&self, estimate: &HorizonEstimate) -> i64 {
        if estimate.is_low_confidence() {
            estimate.max_lead_days.ceil() as i64
        } else {
            i64::from(self.config.edge_margin_days)
        }
    }

    fn check_consistency(
        &self,
        slot: &SlotId,
        observations: &[Observation],
        walked: usize,
        cycle: Option<Duration>,
    ) -> Option<SlotlineError> {
        let appointment = slot.appointment;
        let grace_secs = cycle
            .map_or(0, |cycle| cycle.num_seconds())
            .saturating_mul(i64::from(self.config.grace_cycles));

        observations[walked..]
            .iter()
            .find(|observation| {
                observation.lists(&appointment)
                    && (observation.grab - appointment).num_seconds() > grace_secs
            })
            .map(|observation| {
                SlotlineError::inconsistent(
                    slot.clone(),
                    format!(
                        "listed at {} more than {} observation cycle(s) after its appointment",
                        observation.grab.to_rfc3339(),
                        self.config.grace_cycles
                    ),
                )
            })
    }
}

/// Median gap between consecutive grabs
///
/// `None` for fewer than two observations.
pub fn observation_cycle(observations: &[Observation]) -> Option<Duration> {
    let mut gaps: Vec<Duration> =
        observations.windows(2).map(|pair| pair[1].grab - pair[0].grab).collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort();

    let mid = gaps.len() / 2;
    if gaps.len() % 2 == 0 {
        Some((gaps[mid - 1] + gaps[mid]) / 2)
    } else {
        Some(gaps[mid])
    }
}

/// Mutable walk state, private to one `reconstruct_slot` call
struct SlotWalk<'a> {
    calendar: &'a PortalCalendar,
    appointment: DateTime<Utc>,
    horizon_advance: i64,
    window: i64,
    state: SlotState,
    segments: Vec<Segment>,
    transitions: Vec<Transition>,
    prev_grab: Option<DateTime<Utc>>,
    /// Largest date lead at which the slot itself was listed
    max_seen_lead: Option<i64>,
}

impl SlotWalk<'_> {
    /// Date lead beyond which the slot cannot be listed yet
    fn edge_lead(&self) -> i64 {
        self.max_seen_lead.map_or(self.horizon_advance, |seen| seen.max(self.horizon_advance))
    }

    fn step(&mut self, observation: &Observation) {
        let grab = observation.grab;
        let listed = observation.lists(&self.appointment);

        // Absent at the appointment itself says nothing about a booking.
        if !listed && grab == self.appointment {
            return;
        }

        let date_lead = self.calendar.date_lead(self.appointment, grab);

        if listed {
            if self.state == SlotState::Booked {
                self.transition(TransitionKind::Cancellation, grab);
            }
            self.state = SlotState::Available;
            self.max_seen_lead = Some(self.max_seen_lead.map_or(date_lead, |seen| seen.max(date_lead)));
            self.enter(SegmentStatus::Available, grab, false);
        } else {
            match self.state {
                SlotState::Unseen | SlotState::OutOfHorizon => {
                    if date_lead > self.edge_lead() {
                        self.state = SlotState::OutOfHorizon;
                        self.enter(SegmentStatus::OutOfHorizon, grab, false);
                    } else {
                        self.state = SlotState::Unseen;
                        self.enter(SegmentStatus::Unknown, grab, false);
                    }
                }
                SlotState::Available => {
                    if date_lead > self.edge_lead() - self.window {
                        self.state = SlotState::Ambiguous;
                        self.enter(SegmentStatus::Unknown, grab, true);
                    } else {
                        self.transition(TransitionKind::Booking, grab);
                        self.state = SlotState::Booked;
                        self.enter(SegmentStatus::Booked, grab, false);
                    }
                }
                SlotState::Booked
                | SlotState::Ambiguous
                | SlotState::FinalBooked
                | SlotState::FinalUnused
                | SlotState::FinalUnresolved => {}
            }
        }

        self.prev_grab = Some(grab);
    }

    fn transition(&mut self, kind: TransitionKind, before: DateTime<Utc>) {
        if let Some(after) = self.prev_grab {
            self.transitions.push(Transition { kind, after, before });
        }
    }

    fn enter(&mut self, status: SegmentStatus, grab: DateTime<Utc>, ambiguous: bool) {
        match self.segments.last_mut() {
            Some(last) if last.status == status && last.ambiguous == ambiguous => {}
            Some(last) => {
                last.end = Some(grab);
                self.segments.push(Segment { status, start: grab, end: None, ambiguous });
            }
            None => self.segments.push(Segment { status, start: grab, end: None, ambiguous }),
        }
    }

    fn finish(mut self, settled: bool) -> (Vec<Segment>, Vec<Transition>, SlotState) {
        if !settled {
            return (self.segments, self.transitions, self.state);
        }

        if let Some(last) = self.segments.last_mut() {
            last.end = Some(self.appointment);
        }
        let state = match self.state {
            SlotState::Available | SlotState::FinalUnused => SlotState::FinalUnused,
            SlotState::Booked | SlotState::FinalBooked => SlotState::FinalBooked,
            SlotState::Unseen
            | SlotState::Ambiguous
            | SlotState::OutOfHorizon
            | SlotState::FinalUnresolved => SlotState::FinalUnresolved,
        };
        (self.segments, self.transitions, state)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use slotline_domain::{Confidence, FinalStatus, LowConfidenceReason};

    use super::*;

    fn grab(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, day, hour, 0, 0).unwrap()
    }

    fn pair() -> PairKey {
        PairKey::new("C1", "blood")
    }

    fn estimate(advance: i64, confidence: Confidence) -> HorizonEstimate {
        HorizonEstimate {
            pair: pair(),
            min_lead_days: 0.1,
            max_lead_days: advance as f64 + 0.2,
            horizon_advance_days: advance,
            confidence,
            distinct_slots: 50,
            observations: 10,
            advances: Vec::new(),
            postings: Vec::new(),
            first_appearances: Vec::new(),
        }
    }

    fn confident(advance: i64) -> HorizonEstimate {
        estimate(advance, Confidence::Normal)
    }

    fn obs(at: DateTime<Utc>, slots: &[DateTime<Utc>]) -> Observation {
        Observation::new(at, pair(), slots.iter().copied())
    }

    fn reconstructor() -> HistoryReconstructor {
        HistoryReconstructor::new(ReconstructionConfig::default(), PortalCalendar::default())
    }

    fn run(observations: &[Observation], appointment: DateTime<Utc>, est: &HorizonEstimate) -> SlotOutcome {
        let slot = SlotId::in_pair(&pair(), appointment);
        reconstructor().reconstruct_slot(&slot, observations, est, observation_cycle(observations))
    }

    fn statuses(timeline: &SlotTimeline) -> Vec<SegmentStatus> {
        timeline.segments.iter().map(|segment| segment.status).collect()
    }

    #[test]
    fn test_booking_between_last_sighting_and_absence() {
        let appt = grab(10, 9);
        let observations = vec![
            obs(grab(1, 6), &[appt]),
            obs(grab(2, 6), &[appt]),
            obs(grab(3, 6), &[]),
            obs(grab(11, 6), &[]),
        ];

        let outcome = run(&observations, appt, &confident(14));
        let timeline = outcome.timeline;

        assert!(outcome.issue.is_none());
        assert_eq!(statuses(&timeline), vec![SegmentStatus::Available, SegmentStatus::Booked]);
        assert_eq!(timeline.segments[0].end, Some(grab(3, 6)));
        assert_eq!(timeline.segments[1].end, Some(appt));
        assert_eq!(
            timeline.transitions,
            vec![Transition { kind: TransitionKind::Booking, after: grab(2, 6), before: grab(3, 6) }]
        );
        assert_eq!(timeline.final_status(), Some(FinalStatus::Booked));
    }

    #[test]
    fn test_reappearance_is_cancellation() {
        let appt = grab(20, 9);
        let observations =
            vec![obs(grab(1, 6), &[appt]), obs(grab(2, 6), &[]), obs(grab(3, 6), &[appt])];

        let timeline = run(&observations, appt, &confident(30)).timeline;

        assert_eq!(
            statuses(&timeline),
            vec![SegmentStatus::Available, SegmentStatus::Booked, SegmentStatus::Available]
        );
        assert_eq!(timeline.transitions[1].kind, TransitionKind::Cancellation);
        assert_eq!(timeline.transitions[1].after, grab(2, 6));
        assert_eq!(timeline.transitions[1].before, grab(3, 6));
        assert_eq!(timeline.state, SlotState::Available);
        assert_eq!(timeline.segments[2].end, None);
    }

    #[test]
    fn test_out_of_horizon_before_first_listing() {
        // Horizon of 3 days: the 10th opens on the 7th.
        let appt = grab(10, 9);
        let observations = vec![
            obs(grab(5, 6), &[]),
            obs(grab(6, 6), &[]),
            obs(grab(7, 6), &[appt]),
            obs(grab(8, 6), &[appt]),
        ];

        let timeline = run(&observations, appt, &confident(3)).timeline;

        assert_eq!(statuses(&timeline), vec![SegmentStatus::OutOfHorizon, SegmentStatus::Available]);
        assert_eq!(timeline.segments[0].start, grab(5, 6));
        assert_eq!(timeline.segments[1].start, grab(7, 6));
        assert!(timeline.transitions.is_empty());
    }

    #[test]
    fn test_unseen_inside_horizon_is_unknown() {
        let appt = grab(10, 9);
        let observations = vec![obs(grab(8, 6), &[]), obs(grab(9, 6), &[appt])];

        let timeline = run(&observations, appt, &confident(3)).timeline;

        assert_eq!(statuses(&timeline), vec![SegmentStatus::Unknown, SegmentStatus::Available]);
        assert!(!timeline.segments[0].ambiguous);
        assert!(timeline.transitions.is_empty());
    }

    #[test]
    fn test_low_confidence_disappearance_is_ambiguous() {
        let appt = grab(10, 9);
        let low = estimate(
            3,
            Confidence::Low {
                reasons: vec![LowConfidenceReason::TooFewSlots { observed: 2, required: 10 }],
            },
        );
        let observations = vec![
            obs(grab(7, 6), &[appt]),
            obs(grab(8, 6), &[]),
            obs(grab(9, 6), &[appt]),
            obs(grab(10, 6), &[]),
            obs(grab(11, 6), &[]),
        ];

        let timeline = run(&observations, appt, &low).timeline;

        assert!(timeline.transitions.is_empty());
        assert_eq!(timeline.segments[1].status, SegmentStatus::Unknown);
        assert!(timeline.segments[1].ambiguous);
        assert_eq!(timeline.state, SlotState::FinalUnresolved);
    }

    #[test]
    fn test_low_confidence_window_is_max_lead() {
        // Advance of 10 days but no slot seen more than 2.5 days out: the
        // window covers leads 8..=10 only.
        let appt = grab(10, 18);
        let mut low = estimate(
            10,
            Confidence::Low {
                reasons: vec![LowConfidenceReason::TooFewSlots { observed: 3, required: 10 }],
            },
        );
        low.max_lead_days = 2.5;
        let observations =
            vec![obs(grab(8, 6), &[appt]), obs(grab(9, 6), &[]), obs(grab(10, 20), &[])];

        let timeline = run(&observations, appt, &low).timeline;

        assert_eq!(timeline.transitions.len(), 1);
        assert_eq!(timeline.state, SlotState::FinalBooked);
    }

    #[test]
    fn test_window_days_rounds_lead_up() {
        let reasons = vec![LowConfidenceReason::NoHorizonAdvanceObserved];
        let mut low = estimate(10, Confidence::Low { reasons });
        low.max_lead_days = 2.5;
        assert_eq!(reconstructor().window_days(&low), 3);

        low.max_lead_days = 0.0;
        assert_eq!(reconstructor().window_days(&low), 0);

        let margin = ReconstructionConfig::default().edge_margin_days;
        assert_eq!(reconstructor().window_days(&confident(10)), i64::from(margin));
    }

    #[test]
    fn test_edge_margin_makes_confident_edge_ambiguous() {
        let appt = grab(10, 9);
        let observations = vec![obs(grab(7, 6), &[appt]), obs(grab(8, 6), &[])];
        let slot = SlotId::in_pair(&pair(), appt);
        let reconstructor = HistoryReconstructor::new(
            ReconstructionConfig { edge_margin_days: 2, ..ReconstructionConfig::default() },
            PortalCalendar::default(),
        );

        let outcome = reconstructor.reconstruct_slot(&slot, &observations, &confident(3), None);

        assert_eq!(outcome.timeline.state, SlotState::Ambiguous);
        assert!(outcome.timeline.transitions.is_empty());
    }

    #[test]
    fn test_absent_at_appointment_is_not_a_booking() {
        let appt = grab(10, 6);
        let observations = vec![obs(grab(9, 6), &[appt]), obs(appt, &[]), obs(grab(11, 6), &[])];

        let timeline = run(&observations, appt, &confident(3)).timeline;

        assert!(timeline.transitions.is_empty());
        assert_eq!(timeline.state, SlotState::FinalUnused);
        assert_eq!(timeline.segments.len(), 1);
    }

    #[test]
    fn test_unsettled_slot_keeps_open_segment() {
        let appt = grab(20, 9);
        let observations = vec![obs(grab(1, 6), &[appt]), obs(grab(2, 6), &[])];

        let timeline = run(&observations, appt, &confident(30)).timeline;

        assert_eq!(timeline.state, SlotState::Booked);
        assert_eq!(timeline.segments.last().unwrap().end, None);
        assert_eq!(timeline.final_status(), None);
    }

    #[test]
    fn test_listing_long_after_appointment_is_inconsistent() {
        let appt = grab(3, 9);
        let observations = vec![
            obs(grab(1, 6), &[appt]),
            obs(grab(2, 6), &[appt]),
            obs(grab(3, 6), &[appt]),
            obs(grab(4, 6), &[]),
            obs(grab(5, 6), &[appt]),
        ];

        let outcome = run(&observations, appt, &confident(3));

        assert!(outcome.timeline.partial);
        assert!(matches!(outcome.issue, Some(SlotlineError::InconsistentSlotHistory { .. })));
        assert_eq!(outcome.timeline.state, SlotState::FinalUnused);
    }

    #[test]
    fn test_listing_within_grace_is_tolerated() {
        let appt = grab(3, 9);
        let observations = vec![
            obs(grab(2, 6), &[appt]),
            obs(grab(3, 6), &[appt]),
            obs(grab(4, 6), &[appt]),
        ];

        let outcome = run(&observations, appt, &confident(3));

        assert!(outcome.issue.is_none());
        assert!(!outcome.timeline.partial);
    }

    #[test]
    fn test_first_listed_just_after_appointment_is_tolerated() {
        let appt = grab(3, 10);
        let observations: Vec<Observation> = (6..=12)
            .map(|hour| {
                let at = grab(3, hour) + Duration::minutes(5);
                if hour == 10 {
                    obs(at, &[appt])
                } else {
                    obs(at, &[])
                }
            })
            .collect();

        let outcome = run(&observations, appt, &confident(3));

        assert!(outcome.issue.is_none());
        assert!(!outcome.timeline.partial);
    }

    #[test]
    fn test_first_listed_past_grace_is_inconsistent() {
        let appt = grab(3, 9);
        let observations = vec![
            obs(grab(1, 6), &[]),
            obs(grab(2, 6), &[]),
            obs(grab(3, 6), &[]),
            obs(grab(6, 6), &[appt]),
        ];

        let outcome = run(&observations, appt, &confident(3));

        assert!(outcome.timeline.partial);
        assert!(outcome.issue.unwrap().to_string().contains("after its appointment"));
        assert_eq!(outcome.timeline.state, SlotState::FinalUnresolved);
    }

    #[test]
    fn test_past_appointments_only_filters_unsettled() {
        let settled = grab(2, 9);
        let open = grab(20, 9);
        let observations = vec![obs(grab(1, 6), &[settled, open]), obs(grab(3, 6), &[open])];
        let reconstructor = HistoryReconstructor::new(
            ReconstructionConfig { past_appointments_only: true, ..ReconstructionConfig::default() },
            PortalCalendar::default(),
        );

        let outcomes = reconstructor.reconstruct_pair(&pair(), &observations, &confident(30));

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].timeline.slot.appointment, settled);
    }

    #[test]
    fn test_observation_cycle_is_median_gap() {
        let observations = vec![
            obs(grab(1, 0), &[]),
            obs(grab(1, 1), &[]),
            obs(grab(1, 2), &[]),
            obs(grab(1, 12), &[]),
        ];
        assert_eq!(observation_cycle(&observations), Some(Duration::hours(1)));
        assert_eq!(observation_cycle(&observations[..1]), None);
        assert_eq!(observation_cycle(&observations[..3]), Some(Duration::hours(1)));
    }
}

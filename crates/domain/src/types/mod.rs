//! Domain types
//!
//! - [`slot`]: identities of pairs and slots
//! - [`observation`]: raw and validated availability snapshots
//! - [`feed`]: tabular feed rows and the center directory
//! - [`horizon`]: per-pair booking-horizon estimates
//! - [`timeline`]: reconstructed per-slot timelines and derived records
//! - [`report`]: batch manifest, summary and report

pub mod feed;
pub mod horizon;
pub mod observation;
pub mod report;
pub mod slot;
pub mod timeline;

pub use feed::{CenterDirectory, CenterInfo, CenterRecord, FeedRow};
pub use horizon::{
    Confidence, FirstAppearance, FirstPosting, HorizonAdvance, HorizonEstimate, LowConfidenceReason,
};
pub use observation::{Observation, RawObservation, RawSlot};
pub use report::{
    BatchReport, IngestReport, ManifestEntry, ManifestKind, PairReconstruction, RunSummary,
};
pub use slot::{CenterId, PairKey, SlotId, TestType};
pub use timeline::{
    ActivityAction, ActivityRecord, FinalStatus, FinalStatusRecord, Segment, SegmentStatus,
    SlotState, SlotTimeline, TimelineRow, Transition, TransitionKind,
};

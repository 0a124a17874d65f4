//! # Slotline Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The snapshot store and feed assembly
//! - The horizon model
//! - The history reconstructor
//! - The batch reconstruction service and its ports
//!
//! ## Architecture Principles
//! - Only depends on `slotline-common` and `slotline-domain`
//! - No file, network or logging-subscriber code
//! - Output leaves through the [`ReportSink`] port
//!
//! Data flows one way: [`SnapshotStore`] → [`HorizonModel`] →
//! [`HistoryReconstructor`] → slot timelines.

pub mod history;
pub mod horizon;
pub mod reconstruction;
pub mod snapshot;

pub use history::{HistoryReconstructor, SlotOutcome};
pub use horizon::{HorizonModel, PortalCalendar};
pub use reconstruction::ports::ReportSink;
pub use reconstruction::{FeedRun, ReconstructionService};
pub use snapshot::{AssembledFeed, FeedAssembler, Insertion, SnapshotStore};

//! Per-slot history reconstruction

pub mod activity;
pub mod reconstructor;

pub use activity::{activity, final_statuses};
pub use reconstructor::{observation_cycle, HistoryReconstructor, SlotOutcome};

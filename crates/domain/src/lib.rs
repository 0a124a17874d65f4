//! # Slotline Domain
//!
//! Business domain types for appointment-slot history reconstruction.
//!
//! This crate contains:
//! - Slot, observation and feed-row types
//! - Horizon estimates, slot timelines and the batch report
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - Depends only on `slotline-common` (foundation tier)
//! - Pure domain models and data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

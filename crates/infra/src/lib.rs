//! # Slotline Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Configuration loading (files, `.env`, `SLOTLINE_*` overrides)
//! - Tracing subscriber setup
//! - Report sinks that write batch results as JSON
//!
//! ## Architecture
//! - Implements traits defined in `slotline-core`
//! - Contains all "impure" code (file system, environment, stdout)

pub mod config;
pub mod export;
pub mod observability;

// Re-export commonly used items
pub use export::{JsonLinesRowSink, JsonReportSink};
pub use observability::init_tracing;

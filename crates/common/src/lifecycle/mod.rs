//! Batch lifecycle utilities
//!
//! - **[`cancel`]**: cooperative cancellation shared between a batch driver
//!   and whoever asked it to stop

pub mod cancel;

pub use cancel::CancelHandle;

//! Batch reconstruction across all pairs

pub mod ports;
pub mod service;

pub use ports::*;
pub use service::*;

//! Error types used throughout the workspace

use slotline_common::error::{CommonError, ErrorSeverity};
use slotline_common::{impl_error_classification, impl_error_conversion};
use thiserror::Error;

use crate::types::{PairKey, SlotId};

/// Main error type for Slotline
///
/// None of these abort a batch. Reconstruction turns them into manifest
/// entries; only configuration and I/O failures surface to callers.
#[derive(Error, Debug)]
pub enum SlotlineError {
    /// Input observation is missing required fields or mixes pairs
    #[error("Malformed observation: {0}")]
    MalformedObservation(String),

    /// A slot's observations contradict each other
    #[error("Inconsistent history for slot {slot}: {reason}")]
    InconsistentSlotHistory { slot: SlotId, reason: String },

    /// Too little data for a confident horizon estimate
    #[error("Insufficient data for {pair}: {reason}")]
    InsufficientData { pair: PairKey, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl SlotlineError {
    /// Create a malformed-observation error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedObservation(message.into())
    }

    /// Create an inconsistent-history error for `slot`
    pub fn inconsistent<S: Into<String>>(slot: SlotId, reason: S) -> Self {
        Self::InconsistentSlotHistory { slot, reason: reason.into() }
    }

    /// Create an insufficient-data error for `pair`
    pub fn insufficient<S: Into<String>>(pair: PairKey, reason: S) -> Self {
        Self::InsufficientData { pair, reason: reason.into() }
    }

    /// Short machine-readable label for the error kind
    pub fn label(&self) -> &'static str {
        match self {
            Self::MalformedObservation(_) => "malformed_observation",
            Self::InconsistentSlotHistory { .. } => "inconsistent_slot_history",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
            Self::Common(_) => "common",
        }
    }
}

impl_error_conversion!(SlotlineError, Common);

impl_error_classification!(SlotlineError, Common,
    Self::MalformedObservation(_) => ErrorSeverity::Warning,
    Self::InconsistentSlotHistory { .. } => ErrorSeverity::Warning,
    Self::InsufficientData { .. } => ErrorSeverity::Info,
    Self::Config(_) => ErrorSeverity::Error,
    Self::Internal(_) => ErrorSeverity::Critical,
);

/// Result type alias for Slotline operations
pub type Result<T> = std::result::Result<T, SlotlineError>;

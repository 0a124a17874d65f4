//! Common error types and utilities
//!
//! This module provides the error handling infrastructure shared by the
//! Slotline crates.
//!
//! # Error Handling Architecture
//!
//! 1. **`CommonError`**: failures at the I/O edges (configuration,
//!    serialization, persistence) that more than one crate reports
//!
//! 2. **`ErrorClassification` trait**: maps an error onto the severity scale
//!
//! 3. **`ErrorSeverity` enum**: the severity scale attached to every
//!    reconstruction manifest entry
//!
//! ## Composition
//!
//! Crate-specific errors compose with `CommonError` rather than duplicating
//! its variants:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum SlotlineError {
//!     #[error("Malformed observation: {0}")]
//!     MalformedObservation(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//!
//! impl_error_conversion!(SlotlineError, Common);
//!
//! impl_error_classification!(SlotlineError, Common,
//!     Self::MalformedObservation(_) => ErrorSeverity::Warning,
//! );
//! ```
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected, informational | Too little data for a confident estimate |
//! | **Warning** | Degraded but operational | Skipped input row, flagged slot history |
//! | **Error** | Failure requiring attention | Invalid configuration, unwritable sink |
//! | **Critical** | Integrity at risk | Worker pool could not be built |

use std::fmt;

use serde::{Deserialize, Serialize};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Error variants shared by the crates that touch files and formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Configuration-related errors
    Config { message: String, field: Option<String> },

    /// Serialization or deserialization errors
    Serialization { message: String, format: Option<String> },

    /// Data persistence errors (file I/O, writers)
    Persistence { message: String, operation: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field } => {
                if let Some(field) = field {
                    write!(f, "Configuration error in field '{}': {}", field, message)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            Self::Serialization { message, format } => {
                if let Some(format) = format {
                    write!(f, "Serialization error ({}): {}", format, message)
                } else {
                    write!(f, "Serialization error: {}", message)
                }
            }
            Self::Persistence { message, operation } => {
                if let Some(op) = operation {
                    write!(f, "Persistence error during '{}': {}", op, message)
                } else {
                    write!(f, "Persistence error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } | Self::Serialization { .. } | Self::Persistence { .. } => {
                ErrorSeverity::Error
            }
        }
    }
}

impl CommonError {
    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a serialization error with format information
    pub fn serialization_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    /// Create a persistence error for a specific operation
    pub fn persistence_op<S: Into<String>, O: Into<String>>(operation: O, message: S) -> Self {
        Self::Persistence { message: message.into(), operation: Some(operation.into()) }
    }
}

/// Maps an error onto [`ErrorSeverity`]
///
/// Used by the reconstruction manifest to attach a severity to every
/// skipped or flagged item.
pub trait ErrorClassification {
    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;
}

/// Error severity levels for monitoring and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

// Standard conversions from common error types
impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence { message: err.to_string(), operation: None }
    }
}

/// Utility macro for creating error conversions from std types
///
/// Generates `From<serde_json::Error>` and `From<std::io::Error>` for an
/// error enum that embeds `CommonError` in `$variant`. `From<CommonError>`
/// itself comes from `#[from]` on that variant.
///
/// ```rust,ignore
/// impl_error_conversion!(SlotlineError, Common);
/// ```
#[macro_export]
macro_rules! impl_error_conversion {
    ($error_type:ty, $variant:ident) => {
        impl From<$crate::error::__serde_json::Error> for $error_type {
            fn from(err: $crate::error::__serde_json::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<std::io::Error> for $error_type {
            fn from(err: std::io::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }
    };
}

/// Macro to implement ErrorClassification by delegating to CommonError
///
/// The embedded `CommonError` variant delegates; every other variant names
/// its severity inline.
///
/// ```rust,ignore
/// impl_error_classification!(SlotlineError, Common,
///     Self::Config(_) => ErrorSeverity::Error,
/// );
/// ```
#[macro_export]
macro_rules! impl_error_classification {
    (
        $error_type:ty,
        $common_variant:ident
        $(, $variant:pat => $severity:expr)*
        $(,)?
    ) => {
        impl $crate::error::ErrorClassification for $error_type {
            fn severity(&self) -> $crate::error::ErrorSeverity {
                match self {
                    Self::$common_variant(e) => $crate::error::ErrorClassification::severity(e),
                    $(
                        $variant => $severity,
                    )*
                }
            }
        }
    };
}

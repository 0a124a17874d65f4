//! Domain constants
//!
//! Defaults for the tunable reconstruction parameters and a few fixed values
//! shared between crates.

// Horizon model defaults
pub const DEFAULT_MIN_DISTINCT_SLOTS: usize = 10;
pub const DEFAULT_MIN_OBSERVATIONS: usize = 2;
pub const DEFAULT_BURST_MIN_SLOTS: usize = 5;
pub const DEFAULT_PORTAL_TIMEZONE: &str = "Europe/London";

// Reconstruction defaults
pub const DEFAULT_EDGE_MARGIN_DAYS: u32 = 0;
pub const DEFAULT_GRACE_CYCLES: u32 = 1;

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Prefix of every environment variable the config loader reads
pub const ENV_PREFIX: &str = "SLOTLINE_";

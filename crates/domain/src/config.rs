//! Configuration structures
//!
//! Every section has serde defaults, so a partial file (or none at all)
//! yields a usable configuration. Loading from disk and the environment
//! lives in `slotline-infra`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BURST_MIN_SLOTS, DEFAULT_EDGE_MARGIN_DAYS, DEFAULT_GRACE_CYCLES, DEFAULT_LOG_LEVEL,
    DEFAULT_MIN_DISTINCT_SLOTS, DEFAULT_MIN_OBSERVATIONS, DEFAULT_PORTAL_TIMEZONE,
};
use crate::errors::{Result, SlotlineError};
use crate::types::feed::{CenterDirectory, CenterRecord};

/// Horizon model tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    /// Below this many distinct slots the estimate is low-confidence
    pub min_distinct_slots: usize,
    /// Below this many observations the estimate is low-confidence
    pub min_observations: usize,
    /// Newly listed slots needed on one day to count as a horizon advance
    pub burst_min_slots: usize,
    /// IANA name of the portal's time zone
    pub portal_timezone: String,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            min_distinct_slots: DEFAULT_MIN_DISTINCT_SLOTS,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
            burst_min_slots: DEFAULT_BURST_MIN_SLOTS,
            portal_timezone: DEFAULT_PORTAL_TIMEZONE.to_string(),
        }
    }
}

/// History reconstructor tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Days below the horizon edge within which a disappearance of a
    /// confidently estimated pair is treated as ambiguous
    pub edge_margin_days: u32,
    /// Observation cycles a slot may stay listed past its appointment
    /// before its history is inconsistent
    pub grace_cycles: u32,
    /// Only report slots whose appointment has passed
    pub past_appointments_only: bool,
    /// Size of a dedicated worker pool; `None` uses the global pool
    pub workers: Option<usize>,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            edge_margin_days: DEFAULT_EDGE_MARGIN_DAYS,
            grace_cycles: DEFAULT_GRACE_CYCLES,
            past_appointments_only: false,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}

/// Complete Slotline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub horizon: HorizonConfig,
    pub reconstruction: ReconstructionConfig,
    pub logging: LoggingConfig,
    /// Center directory; empty disables center validation
    pub centers: Vec<CenterRecord>,
}

impl Config {
    /// Check values serde cannot rule out
    pub fn validate(&self) -> Result<()> {
        if self.horizon.burst_min_slots == 0 {
            return Err(SlotlineError::Config("horizon.burst_min_slots must be at least 1".into()));
        }
        if self.horizon.portal_timezone.trim().is_empty() {
            return Err(SlotlineError::Config("horizon.portal_timezone is empty".into()));
        }
        if self.reconstruction.workers == Some(0) {
            return Err(SlotlineError::Config("reconstruction.workers must be at least 1".into()));
        }
        Ok(())
    }

    pub fn center_directory(&self) -> CenterDirectory {
        CenterDirectory::from_records(self.centers.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.horizon.min_distinct_slots, 10);
        assert_eq!(config.horizon.portal_timezone, "Europe/London");
        assert_eq!(config.reconstruction.grace_cycles, 1);
        assert_eq!(config.reconstruction.edge_margin_days, 0);
        assert!(config.validate().is_ok());
        assert!(config.center_directory().is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"horizon":{"burst_min_slots":3},"centers":[{"id":"C1"}]}"#)
                .unwrap();
        assert_eq!(config.horizon.burst_min_slots, 3);
        assert_eq!(config.horizon.min_observations, 2);
        assert_eq!(config.centers.len(), 1);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.reconstruction.workers = Some(0);
        assert!(matches!(config.validate(), Err(SlotlineError::Config(_))));
    }
}

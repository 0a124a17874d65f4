//! Pair and slot identities

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Test center identifier as published by the portal
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CenterId(String);

impl CenterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CenterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CenterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Kind of test offered at a center (e.g. a blood test)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestType(String);

impl TestType {
    pub fn new(test: impl Into<String>) -> Self {
        Self(test.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestType {
    fn from(test: &str) -> Self {
        Self::new(test)
    }
}

/// A (test center, test type) pair
///
/// The unit of parallelism: every pair has its own observation sequence,
/// horizon estimate and set of slots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub center: CenterId,
    pub test: TestType,
}

impl PairKey {
    pub fn new(center: impl Into<String>, test: impl Into<String>) -> Self {
        Self { center: CenterId::new(center), test: TestType::new(test) }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.center, self.test)
    }
}

/// One bookable appointment instance
///
/// Ordered by center, then test type, then appointment time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId {
    pub center: CenterId,
    pub test: TestType,
    pub appointment: DateTime<Utc>,
}

impl SlotId {
    pub fn new(
        center: impl Into<String>,
        test: impl Into<String>,
        appointment: DateTime<Utc>,
    ) -> Self {
        Self { center: CenterId::new(center), test: TestType::new(test), appointment }
    }

    /// Build a slot id belonging to `pair`
    pub fn in_pair(pair: &PairKey, appointment: DateTime<Utc>) -> Self {
        Self { center: pair.center.clone(), test: pair.test.clone(), appointment }
    }

    pub fn pair(&self) -> PairKey {
        PairKey { center: self.center.clone(), test: self.test.clone() }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.center,
            self.test,
            self.appointment.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

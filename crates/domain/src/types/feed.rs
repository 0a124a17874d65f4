//! Tabular feed rows and the center directory

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::slot::{CenterId, TestType};

/// One row of the availability feed: one available slot at one grab
///
/// The appointment time is the portal's local wall-clock time; the grab is
/// recorded in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRow {
    pub appointment: Option<NaiveDateTime>,
    pub grab: Option<DateTime<Utc>>,
    pub center_id: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
    pub test_type: Option<String>,
}

/// Directory entry describing one test center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterRecord {
    pub id: CenterId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub appointments_url: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
}

impl CenterRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: CenterId::new(id),
            name: None,
            address: None,
            latitude: None,
            longitude: None,
            web_url: None,
            appointments_url: None,
            age_group: None,
        }
    }
}

/// Read-only lookup of known centers
///
/// An empty directory accepts every center id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CenterDirectory {
    centers: BTreeMap<CenterId, CenterRecord>,
}

impl CenterDirectory {
    pub fn from_records(records: impl IntoIterator<Item = CenterRecord>) -> Self {
        Self { centers: records.into_iter().map(|record| (record.id.clone(), record)).collect() }
    }

    pub fn get(&self, id: &CenterId) -> Option<&CenterRecord> {
        self.centers.get(id)
    }

    /// Whether `id` may appear in the feed
    pub fn accepts(&self, id: &CenterId) -> bool {
        self.centers.is_empty() || self.centers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

/// Age groups served and test types administered at a center, as seen in
/// the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterInfo {
    pub center: CenterId,
    pub age_groups: BTreeSet<String>,
    pub tests: BTreeSet<TestType>,
}

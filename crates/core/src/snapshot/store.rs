//! Snapshot store
//!
//! Holds every observation, grouped by pair and sorted by grab time. The
//! store is filled once and then only read, so reconstruction workers can
//! share it without locking.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use slotline_domain::{
    CenterId, IngestReport, Observation, PairKey, RawObservation, Result, TestType,
};
use tracing::{debug, warn};

/// How an observation landed in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Inserted,
    /// Same pair and grab as an existing observation; slot sets were merged
    Merged,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    pairs: BTreeMap<PairKey, Vec<Observation>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a raw observation
    ///
    /// # Errors
    ///
    /// `MalformedObservation` when a required field is missing or a slot
    /// belongs to another pair. The store is unchanged in that case.
    pub fn add_observation(&mut self, raw: RawObservation) -> Result<Insertion> {
        let observation = Observation::try_from(raw)?;
        Ok(self.insert(observation))
    }

    /// Insert a validated observation, keeping the pair's sequence ordered
    /// by grab time
    pub fn insert(&mut self, observation: Observation) -> Insertion {
        let sequence = self.pairs.entry(observation.pair.clone()).or_default();
        match sequence.binary_search_by(|existing| existing.grab.cmp(&observation.grab)) {
            Ok(index) => {
                sequence[index].available.extend(observation.available);
                Insertion::Merged
            }
            Err(index) => {
                sequence.insert(index, observation);
                Insertion::Inserted
            }
        }
    }

    /// Add many raw observations, skipping malformed ones
    pub fn ingest(&mut self, observations: impl IntoIterator<Item = RawObservation>) -> IngestReport {
        let mut report = IngestReport::default();
        for (index, raw) in observations.into_iter().enumerate() {
            match self.add_observation(raw) {
                Ok(insertion) => {
                    report.accepted += 1;
                    if insertion == Insertion::Merged {
                        report.merged += 1;
                    }
                }
                Err(err) => {
                    warn!(index, kind = err.label(), error = %err, "skipping malformed observation");
                    report.skip(&err);
                }
            }
        }
        debug!(
            accepted = report.accepted,
            merged = report.merged,
            skipped = report.skipped.len(),
            "ingest complete"
        );
        report
    }

    /// Time-ordered observations of one pair
    ///
    /// The iterator is `Clone`, so callers may walk the sequence as often as
    /// they like. Unknown pairs yield nothing.
    pub fn observations_for(
        &self,
        center: &CenterId,
        test: &TestType,
    ) -> std::slice::Iter<'_, Observation> {
        let pair = PairKey { center: center.clone(), test: test.clone() };
        self.observations(&pair).iter()
    }

    /// Time-ordered observations of one pair as a slice
    pub fn observations(&self, pair: &PairKey) -> &[Observation] {
        self.pairs.get(pair).map(Vec::as_slice).unwrap_or_default()
    }

    /// Pairs with at least one observation, in key order
    pub fn pairs(&self) -> impl Iterator<Item = &PairKey> + '_ {
        self.pairs.keys()
    }

    /// Pairs with their observation sequences, in key order
    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &[Observation])> + '_ {
        self.pairs.iter().map(|(pair, sequence)| (pair, sequence.as_slice()))
    }

    /// Every appointment time ever listed for `pair`
    pub fn slots_for(&self, pair: &PairKey) -> BTreeSet<DateTime<Utc>> {
        self.observations(pair)
            .iter()
            .flat_map(|observation| observation.available.iter().copied())
            .collect()
    }

    pub fn last_grab(&self, pair: &PairKey) -> Option<DateTime<Utc>> {
        self.observations(pair).last().map(|observation| observation.grab)
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of observations across all pairs
    pub fn observation_count(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }
}

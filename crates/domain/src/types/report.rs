//! Batch report: reconstructed pairs, manifest and run summary

use serde::{Deserialize, Serialize};
use slotline_common::error::{ErrorClassification, ErrorSeverity};

use crate::errors::SlotlineError;
use crate::types::horizon::HorizonEstimate;
use crate::types::slot::{PairKey, SlotId};
use crate::types::timeline::{SlotTimeline, TimelineRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    /// Input dropped before reconstruction
    Skipped,
    /// Slot reconstructed but its history is partial
    Flagged,
    /// Pair reconstructed with the conservative fallback
    InsufficientData,
}

crate::impl_domain_status_conversions!(ManifestKind {
    Skipped => "skipped",
    Flagged => "flagged",
    InsufficientData => "insufficient_data",
});

/// One skipped or flagged item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub kind: ManifestKind,
    pub severity: ErrorSeverity,
    pub pair: Option<PairKey>,
    pub slot: Option<SlotId>,
    pub message: String,
}

impl ManifestEntry {
    /// Build an entry from `error`, taking the pair and slot from the error
    /// itself when it names them
    pub fn from_error(kind: ManifestKind, error: &SlotlineError) -> Self {
        let (pair, slot) = match error {
            SlotlineError::InconsistentSlotHistory { slot, .. } => (Some(slot.pair()), Some(slot.clone())),
            SlotlineError::InsufficientData { pair, .. } => (Some(pair.clone()), None),
            _ => (None, None),
        };
        Self { kind, severity: error.severity(), pair, slot, message: error.to_string() }
    }
}

/// Outcome of loading observations into the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub accepted: usize,
    /// Accepted observations whose grab matched an existing one and were
    /// merged into it
    pub merged: usize,
    pub skipped: Vec<ManifestEntry>,
}

impl IngestReport {
    pub fn skip(&mut self, error: &SlotlineError) {
        self.skipped.push(ManifestEntry::from_error(ManifestKind::Skipped, error));
    }

    /// Fold another report into this one
    pub fn absorb(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.merged += other.merged;
        self.skipped.extend(other.skipped);
    }
}

/// Per-run counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub pairs: usize,
    /// Pairs never started because the run was cancelled
    pub pairs_cancelled: usize,
    pub slots: usize,
    pub clean: usize,
    pub flagged: usize,
    /// Input records dropped before reconstruction
    pub skipped: usize,
}

/// Horizon estimate and slot timelines of one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReconstruction {
    pub pair: PairKey,
    pub estimate: HorizonEstimate,
    pub timelines: Vec<SlotTimeline>,
}

/// Result of one batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub pairs: Vec<PairReconstruction>,
    pub manifest: Vec<ManifestEntry>,
    pub summary: RunSummary,
}

impl BatchReport {
    pub fn timelines(&self) -> impl Iterator<Item = &SlotTimeline> + '_ {
        self.pairs.iter().flat_map(|pair| pair.timelines.iter())
    }

    pub fn estimates(&self) -> impl Iterator<Item = &HorizonEstimate> + '_ {
        self.pairs.iter().map(|pair| &pair.estimate)
    }

    pub fn rows(&self) -> Vec<TimelineRow> {
        self.timelines().flat_map(SlotTimeline::rows).collect()
    }

    pub fn timeline(&self, slot: &SlotId) -> Option<&SlotTimeline> {
        self.timelines().find(|timeline| &timeline.slot == slot)
    }
}

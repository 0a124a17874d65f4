//! Reconstruction service - batch driver
//!
//! Runs the horizon model and the history reconstructor for every pair in
//! the store on a rayon pool. Pairs are independent: each worker reads only
//! its own observation sequence and produces only its own timelines.
//! Cancellation stops pairs that have not started; pairs already running
//! finish.

use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use slotline_common::lifecycle::CancelHandle;
use slotline_domain::{
    BatchReport, CenterDirectory, CenterInfo, Config, FeedRow, IngestReport, ManifestEntry,
    ManifestKind, Observation, PairKey, PairReconstruction, Result, RunSummary, SlotlineError,
};
use tracing::{debug, info, warn};

use super::ports::ReportSink;
use crate::history::HistoryReconstructor;
use crate::horizon::{insufficiency, HorizonModel, PortalCalendar};
use crate::snapshot::{FeedAssembler, SnapshotStore};

/// Output of [`ReconstructionService::run_feed`]
#[derive(Debug, Clone)]
pub struct FeedRun {
    pub report: BatchReport,
    pub centers: Vec<CenterInfo>,
}

struct PairOutcome {
    reconstruction: PairReconstruction,
    manifest: Vec<ManifestEntry>,
}

/// Batch reconstruction service
pub struct ReconstructionService {
    model: HorizonModel,
    reconstructor: HistoryReconstructor,
    calendar: PortalCalendar,
    workers: Option<usize>,
    cancel: CancelHandle,
}

impl ReconstructionService {
    /// Create a service from validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let calendar = PortalCalendar::from_config(&config.horizon)?;
        Ok(Self {
            model: HorizonModel::new(config.horizon.clone(), calendar),
            reconstructor: HistoryReconstructor::new(config.reconstruction.clone(), calendar),
            calendar,
            workers: config.reconstruction.workers,
            cancel: CancelHandle::new(),
        })
    }

    /// Share a cancellation handle with the caller
    pub fn with_cancellation(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn calendar(&self) -> &PortalCalendar {
        &self.calendar
    }

    /// Reconstruct every pair in `store`
    ///
    /// Never fails because of the data: malformed input, inconsistent slots
    /// and thin pairs end up in the manifest. Errors come only from building
    /// the worker pool.
    pub fn run(&self, store: &SnapshotStore, ingest: &IngestReport) -> Result<BatchReport> {
        let started = Instant::now();
        let pairs: Vec<(&PairKey, &[Observation])> = store.iter().collect();

        let outcomes: Vec<Option<PairOutcome>> = match self.workers {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|index| format!("slotline-worker-{index}"))
                    .build()
                    .map_err(|err| SlotlineError::Internal(format!("worker pool: {err}")))?;
                pool.install(|| self.run_pairs(&pairs))
            }
            None => self.run_pairs(&pairs),
        };

        let mut report = BatchReport { manifest: ingest.skipped.clone(), ..BatchReport::default() };
        let mut summary = RunSummary { skipped: ingest.skipped.len(), ..RunSummary::default() };

        for outcome in outcomes {
            let Some(outcome) = outcome else {
                summary.pairs_cancelled += 1;
                continue;
            };
            summary.pairs += 1;
            for timeline in &outcome.reconstruction.timelines {
                summary.slots += 1;
                if timeline.partial {
                    summary.flagged += 1;
                } else {
                    summary.clean += 1;
                }
            }
            report.manifest.extend(outcome.manifest);
            report.pairs.push(outcome.reconstruction);
        }
        report.pairs.sort_by(|a, b| a.pair.cmp(&b.pair));
        report.summary = summary;

        if summary.pairs_cancelled > 0 {
            warn!(pairs_cancelled = summary.pairs_cancelled, "reconstruction cancelled");
        }
        info!(
            pairs = summary.pairs,
            pairs_cancelled = summary.pairs_cancelled,
            slots = summary.slots,
            clean = summary.clean,
            flagged = summary.flagged,
            skipped = summary.skipped,
            duration_ms = started.elapsed().as_millis() as u64,
            "reconstruction finished"
        );
        Ok(report)
    }

    /// Assemble feed rows, then reconstruct
    pub fn run_feed(
        &self,
        rows: impl IntoIterator<Item = FeedRow>,
        directory: &CenterDirectory,
    ) -> Result<FeedRun> {
        let feed = FeedAssembler::new(&self.calendar, directory).assemble(rows);
        let mut store = SnapshotStore::new();
        for observation in feed.observations {
            store.insert(observation);
        }
        let report = self.run(&store, &feed.report)?;
        Ok(FeedRun { report, centers: feed.centers })
    }

    /// Reconstruct and hand the report to `sink`
    pub fn run_and_export(
        &self,
        store: &SnapshotStore,
        ingest: &IngestReport,
        sink: &mut dyn ReportSink,
    ) -> Result<BatchReport> {
        let report = self.run(store, ingest)?;
        sink.write_report(&report)?;
        Ok(report)
    }

    fn run_pairs(&self, pairs: &[(&PairKey, &[Observation])]) -> Vec<Option<PairOutcome>> {
        pairs
            .par_iter()
            .map(|(pair, observations)| {
                if self.cancel.is_cancelled() {
                    debug!(pair = %pair, "skipping pair after cancellation");
                    return None;
                }
                Some(self.reconstruct_pair(pair, observations))
            })
            .collect()
    }

    fn reconstruct_pair(&self, pair: &PairKey, observations: &[Observation]) -> PairOutcome {
        let estimate = self.model.estimate(pair, observations);
        let mut manifest = Vec::new();

        if let Some(err) = insufficiency(&estimate) {
            info!(pair = %pair, error = %err, "using conservative fallback");
            manifest.push(ManifestEntry::from_error(ManifestKind::InsufficientData, &err));
        }

        let mut timelines = Vec::new();
        for outcome in self.reconstructor.reconstruct_pair(pair, observations, &estimate) {
            if let Some(issue) = outcome.issue {
                warn!(slot = %outcome.timeline.slot, kind = issue.label(), error = %issue, "slot history flagged");
                manifest.push(ManifestEntry::from_error(ManifestKind::Flagged, &issue));
            }
            timelines.push(outcome.timeline);
        }

        debug!(pair = %pair, slots = timelines.len(), "pair reconstructed");
        PairOutcome {
            reconstruction: PairReconstruction { pair: pair.clone(), estimate, timelines },
            manifest,
        }
    }
}

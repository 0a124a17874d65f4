//! Port interfaces for reconstruction output
//!
//! These traits define the boundary between the batch service and the
//! infrastructure that persists its results.

use slotline_domain::{BatchReport, Result};

/// Destination for a finished batch report
pub trait ReportSink: Send {
    /// Persist or forward the report
    fn write_report(&mut self, report: &BatchReport) -> Result<()>;
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn write_report(&mut self, report: &BatchReport) -> Result<()> {
        (**self).write_report(report)
    }
}

//! JSON implementations of [`ReportSink`]

use std::io::Write;

use slotline_common::CommonError;
use slotline_core::ReportSink;
use slotline_domain::{BatchReport, Result, SlotlineError};

fn write_failed(error: &std::io::Error) -> SlotlineError {
    CommonError::persistence_op("write_report", error.to_string()).into()
}

fn encode_failed(error: serde_json::Error) -> SlotlineError {
    if error.is_io() {
        CommonError::persistence_op("write_report", error.to_string()).into()
    } else {
        error.into()
    }
}

/// Writes the whole report (pairs, manifest, summary) as one JSON document
#[derive(Debug)]
pub struct JsonReportSink<W> {
    writer: W,
    pretty: bool,
}

impl<W: Write + Send> JsonReportSink<W> {
    /// Pretty-printed output
    pub fn new(writer: W) -> Self {
        Self { writer, pretty: true }
    }

    /// Single-line output
    pub fn compact(writer: W) -> Self {
        Self { writer, pretty: false }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ReportSink for JsonReportSink<W> {
    fn write_report(&mut self, report: &BatchReport) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, report)
        } else {
            serde_json::to_writer(&mut self.writer, report)
        }
        .map_err(encode_failed)?;
        self.writer.write_all(b"\n").map_err(|e| write_failed(&e))?;
        self.writer.flush().map_err(|e| write_failed(&e))?;

        tracing::debug!(pairs = report.pairs.len(), "Wrote JSON report");
        Ok(())
    }
}

/// Writes one `TimelineRow` per line (JSON Lines)
#[derive(Debug)]
pub struct JsonLinesRowSink<W> {
    writer: W,
    rows_written: usize,
}

impl<W: Write + Send> JsonLinesRowSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows_written: 0 }
    }

    /// Rows written across all reports so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ReportSink for JsonLinesRowSink<W> {
    fn write_report(&mut self, report: &BatchReport) -> Result<()> {
        let rows = report.rows();
        for row in &rows {
            serde_json::to_writer(&mut self.writer, row).map_err(encode_failed)?;
            self.writer.write_all(b"\n").map_err(|e| write_failed(&e))?;
        }
        self.writer.flush().map_err(|e| write_failed(&e))?;
        self.rows_written += rows.len();

        tracing::debug!(rows = rows.len(), "Wrote timeline rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use slotline_common::ErrorClassification;
    use slotline_core::{ReconstructionService, SnapshotStore};
    use slotline_domain::{Config, RawObservation};

    use super::*;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn grab(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap() + Duration::days(day)
    }

    fn sample_report() -> BatchReport {
        let early = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 9, 9, 0, 0).unwrap();
        let mut store = SnapshotStore::new();
        store.ingest([
            RawObservation::new(grab(0), "C1", "practical", [early, late]),
            RawObservation::new(grab(1), "C1", "practical", [late]),
            RawObservation::new(grab(4), "C1", "practical", [late]),
        ]);
        let service = ReconstructionService::new(&Config::default()).unwrap();
        service.run(&store, &Default::default()).unwrap()
    }

    #[test]
    fn test_json_lines_one_row_per_segment() {
        let report = sample_report();
        let expected = report.rows();
        assert!(!expected.is_empty());

        let mut sink = JsonLinesRowSink::new(Vec::new());
        sink.write_report(&report).unwrap();
        assert_eq!(sink.rows_written(), expected.len());

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), expected.len());
        let row: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(row["slot_id"], expected[0].slot_id.as_str());
        assert_eq!(row["center_id"], "C1");
    }

    #[test]
    fn test_json_report_compact_is_single_line() {
        let report = sample_report();
        let mut sink = JsonReportSink::compact(Vec::new());
        sink.write_report(&report).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output.lines().count(), 1);
        let parsed: BatchReport = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_write_failure_is_persistence_error() {
        let mut sink = JsonLinesRowSink::new(FailingWriter);
        let err = sink.write_report(&sample_report()).unwrap_err();
        assert!(matches!(err, SlotlineError::Common(CommonError::Persistence { .. })));
        assert_eq!(err.severity(), slotline_common::ErrorSeverity::Error);
    }
}

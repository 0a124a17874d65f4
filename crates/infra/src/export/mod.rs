//! Report sinks writing batch results as JSON

pub mod json;

pub use json::{JsonLinesRowSink, JsonReportSink};

//! Feed assembly
//!
//! The feed has one row per available slot per grab. Rows are grouped by
//! (pair, grab) into observations; appointment times are localised in the
//! portal calendar and center ids checked against the directory. Bad rows
//! are skipped and reported, never fatal.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use slotline_domain::{
    CenterDirectory, CenterId, CenterInfo, FeedRow, IngestReport, Observation, PairKey, Result,
    SlotlineError, TestType,
};
use tracing::{debug, warn};

use crate::horizon::PortalCalendar;

/// Observations and center table built from feed rows
#[derive(Debug, Clone, Default)]
pub struct AssembledFeed {
    /// Sorted by pair, then grab
    pub observations: Vec<Observation>,
    /// `accepted` counts rows, not observations
    pub report: IngestReport,
    pub centers: Vec<CenterInfo>,
}

pub struct FeedAssembler<'a> {
    calendar: &'a PortalCalendar,
    directory: &'a CenterDirectory,
}

struct ValidRow {
    pair: PairKey,
    grab: DateTime<Utc>,
    appointment: DateTime<Utc>,
    age_group: Option<String>,
}

impl<'a> FeedAssembler<'a> {
    pub fn new(calendar: &'a PortalCalendar, directory: &'a CenterDirectory) -> Self {
        Self { calendar, directory }
    }

    pub fn assemble(&self, rows: impl IntoIterator<Item = FeedRow>) -> AssembledFeed {
        let mut report = IngestReport::default();
        let mut grouped: BTreeMap<(PairKey, DateTime<Utc>), BTreeSet<DateTime<Utc>>> =
            BTreeMap::new();
        let mut centers: BTreeMap<CenterId, (BTreeSet<String>, BTreeSet<TestType>)> =
            BTreeMap::new();

        for (index, row) in rows.into_iter().enumerate() {
            let row = match self.validate(row) {
                Ok(row) => row,
                Err(err) => {
                    warn!(row = index, error = %err, "skipping feed row");
                    report.skip(&err);
                    continue;
                }
            };
            report.accepted += 1;

            let info = centers.entry(row.pair.center.clone()).or_default();
            info.0.extend(row.age_group);
            info.1.insert(row.pair.test.clone());

            grouped.entry((row.pair, row.grab)).or_default().insert(row.appointment);
        }

        let observations: Vec<Observation> = grouped
            .into_iter()
            .map(|((pair, grab), available)| Observation { grab, pair, available })
            .collect();
        let centers = centers
            .into_iter()
            .map(|(center, (age_groups, tests))| CenterInfo { center, age_groups, tests })
            .collect();

        debug!(
            rows = report.accepted,
            skipped = report.skipped.len(),
            observations = observations.len(),
            "feed assembled"
        );
        AssembledFeed { observations, report, centers }
    }

    fn validate(&self, row: FeedRow) -> Result<ValidRow> {
        let grab = row.grab.ok_or_else(|| SlotlineError::malformed("feed row has no grab"))?;
        let local = row
            .appointment
            .ok_or_else(|| SlotlineError::malformed("feed row has no appointment"))?;
        let center = row
            .center_id
            .filter(|id| !id.trim().is_empty())
            .map(CenterId::new)
            .ok_or_else(|| SlotlineError::malformed("feed row has no center id"))?;
        let test = row
            .test_type
            .filter(|test| !test.trim().is_empty())
            .map(TestType::new)
            .ok_or_else(|| SlotlineError::malformed("feed row has no test type"))?;

        if !self.directory.accepts(&center) {
            return Err(SlotlineError::malformed(format!("unknown center {center}")));
        }

        let appointment = self.calendar.localize(local)?;
        Ok(ValidRow { pair: PairKey { center, test }, grab, appointment, age_group: row.age_group })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, TimeZone};
    use slotline_domain::CenterRecord;

    use super::*;

    fn local(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    fn grab(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 6, 0, 0).unwrap()
    }

    fn row(center: &str, test: &str, grab_day: u32, appt_day: u32) -> FeedRow {
        FeedRow {
            appointment: Some(local(appt_day, 9)),
            grab: Some(grab(grab_day)),
            center_id: Some(center.to_string()),
            age_group: Some("adult".to_string()),
            test_type: Some(test.to_string()),
        }
    }

    #[test]
    fn test_rows_group_by_pair_and_grab() {
        let calendar = PortalCalendar::default();
        let directory = CenterDirectory::default();
        let feed = FeedAssembler::new(&calendar, &directory).assemble(vec![
            row("C1", "blood", 1, 10),
            row("C1", "blood", 1, 11),
            row("C1", "blood", 2, 10),
            row("C2", "blood", 1, 10),
        ]);

        assert_eq!(feed.observations.len(), 3);
        assert_eq!(feed.observations[0].available.len(), 2);
        assert_eq!(feed.observations[0].grab, grab(1));
        assert_eq!(feed.report.accepted, 4);
    }

    #[test]
    fn test_unknown_center_is_skipped() {
        let calendar = PortalCalendar::default();
        let directory = CenterDirectory::from_records([CenterRecord::new("C1")]);
        let feed = FeedAssembler::new(&calendar, &directory)
            .assemble(vec![row("C1", "blood", 1, 10), row("C9", "blood", 1, 10)]);

        assert_eq!(feed.observations.len(), 1);
        assert_eq!(feed.report.skipped.len(), 1);
        assert!(feed.report.skipped[0].message.contains("unknown center C9"));
    }

    #[test]
    fn test_incomplete_rows_are_skipped() {
        let calendar = PortalCalendar::default();
        let directory = CenterDirectory::default();
        let mut missing_grab = row("C1", "blood", 1, 10);
        missing_grab.grab = None;
        let mut blank_test = row("C1", "blood", 1, 10);
        blank_test.test_type = Some(String::new());

        let feed =
            FeedAssembler::new(&calendar, &directory).assemble(vec![missing_grab, blank_test]);

        assert!(feed.observations.is_empty());
        assert_eq!(feed.report.skipped.len(), 2);
    }

    #[test]
    fn test_center_info_collects_tests_and_age_groups() {
        let calendar = PortalCalendar::default();
        let directory = CenterDirectory::default();
        let feed = FeedAssembler::new(&calendar, &directory).assemble(vec![
            row("C1", "blood", 1, 10),
            row("C1", "urine", 1, 10),
            row("C2", "blood", 1, 10),
        ]);

        assert_eq!(feed.centers.len(), 2);
        let c1 = &feed.centers[0];
        assert_eq!(c1.center, CenterId::new("C1"));
        assert_eq!(c1.tests.len(), 2);
        assert!(c1.age_groups.contains("adult"));
    }
}

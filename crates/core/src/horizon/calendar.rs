//! Portal-local calendar arithmetic
//!
//! The portal opens new appointment dates at local midnight, so every
//! day-granular comparison happens in the portal's time zone rather than UTC.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use slotline_domain::{HorizonConfig, Result, SlotlineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalCalendar {
    tz: Tz,
}

impl Default for PortalCalendar {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::London)
    }
}

impl PortalCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA time zone name
    pub fn from_name(name: &str) -> Result<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|err| SlotlineError::Config(format!("unknown portal timezone '{name}': {err}")))
    }

    pub fn from_config(config: &HorizonConfig) -> Result<Self> {
        Self::from_name(&config.portal_timezone)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Portal-local calendar date of `instant`
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Whole calendar days from the grab's local date to the appointment's
    pub fn date_lead(&self, appointment: DateTime<Utc>, grab: DateTime<Utc>) -> i64 {
        (self.local_date(appointment) - self.local_date(grab)).num_days()
    }

    /// Interpret a portal wall-clock time
    ///
    /// Times repeated by a DST fall-back resolve to the earlier instant.
    /// Times skipped by a spring-forward do not exist and are rejected.
    pub fn localize(&self, local: NaiveDateTime) -> Result<DateTime<Utc>> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(at) => Ok(at.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => Err(SlotlineError::malformed(format!(
                "local time {local} does not exist in {}",
                self.tz.name()
            ))),
        }
    }
}

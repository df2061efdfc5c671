//! Time window shared by the schedule fetch and the calendar fetch.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{SyncError, SyncResult};

/// Date range for filtering events.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn unbounded() -> Self {
        DateRange {
            from: None,
            to: None,
        }
    }

    /// From local midnight of the most recent Monday (today, if it is Monday)
    /// through `weeks` whole weeks later.
    pub fn weeks_from_monday(tz: Tz, weeks: u32, now: DateTime<Utc>) -> SyncResult<Self> {
        let today = now.with_timezone(&tz).date_naive();
        let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
        let end = monday + Days::new(7 * u64::from(weeks));

        Ok(DateRange {
            from: Some(local_midnight(tz, monday)?),
            to: Some(local_midnight(tz, end)?),
        })
    }

    /// Whether an interval intersects the range: it must end after `from` and
    /// start before `to`. The calendar API filters with the same rule.
    pub fn overlaps<T: TimeZone>(&self, start: &DateTime<T>, end: &DateTime<T>) -> bool {
        let after_from = self.from.is_none_or(|from| *end > from);
        let before_to = self.to.is_none_or(|to| *start < to);
        after_from && before_to
    }

    pub fn from_rfc3339(&self) -> Option<String> {
        self.from.map(|from| from.to_rfc3339())
    }

    pub fn to_rfc3339(&self) -> Option<String> {
        self.to.map(|to| to.to_rfc3339())
    }
}

fn local_midnight(tz: Tz, date: NaiveDate) -> SyncResult<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| SyncError::Config(format!("No local midnight on {date} in {}", tz.name())))
}

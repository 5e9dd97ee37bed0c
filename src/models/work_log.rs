use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// One clock-in/clock-out pair.
///
/// `end_time == None` means the session is still open. `total_hours` is set
/// together with `end_time` and keeps its sign: a clock that ran backwards
/// produces a negative value, which is stored as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLog {
    pub id: Uuid,
    pub employee_code: String,
    /// The UTC calendar date of the clock-in.
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_hours: Option<f64>,
}

impl WorkLog {
    /// Whether the session has not been clocked out yet.
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

impl TryFrom<&Row> for WorkLog {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            employee_code: row.try_get("employee_code")?,
            date: row.try_get("date")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            total_hours: row.try_get("total_hours")?,
        })
    }
}

/// A work log as presented to clients.
#[derive(Debug, Clone, Serialize)]
pub struct WorkLogView {
    #[serde(flatten)]
    pub log: WorkLog,
    /// `|total_hours|` rounded to two decimals, for display only.
    pub display_hours: Option<f64>,
}

impl From<WorkLog> for WorkLogView {
    fn from(log: WorkLog) -> Self {
        let display_hours = log.total_hours.map(|h| round2(h.abs()));
        Self { log, display_hours }
    }
}

/// Aggregate figures over a list of work logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkLogSummary {
    pub total_sessions: usize,
    /// Distinct calendar dates with at least one session.
    pub working_days: usize,
    pub completed_sessions: usize,
    pub open_sessions: usize,
    /// Sum of the stored hours, rounded to two decimals.
    pub total_hours: f64,
}

/// Where an employee stands for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    NotStarted,
    Working,
    Completed,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

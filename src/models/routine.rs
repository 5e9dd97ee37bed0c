use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// One entry of an employee's routine for a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineTask {
    pub id: Uuid,
    pub employee_code: String,
    pub date: NaiveDate,
    /// Zero-based insertion order within the routine.
    pub position: i32,
    pub task: String,
    pub is_completed: bool,
    /// Set when the task is checked off, cleared when unchecked.
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<&Row> for RoutineTask {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            employee_code: row.try_get("employee_code")?,
            date: row.try_get("date")?,
            position: row.try_get("position")?,
            task: row.try_get("task")?,
            is_completed: row.try_get("is_completed")?,
            completed_at: row.try_get("completed_at")?,
        })
    }
}

/// Completion ratio of a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
    /// Rounded percentage; 0 when the routine is empty.
    pub percentage: u32,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// An employee who clocks in and out and receives routines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// The short code issued at registration; never changes.
    pub code: String,
    /// The employee's display name.
    pub name: String,
    /// The hourly pay rate; never negative.
    pub hourly_rate: f64,
    /// The timestamp when the employee was registered.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Employee {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            hourly_rate: row.try_get("hourly_rate")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

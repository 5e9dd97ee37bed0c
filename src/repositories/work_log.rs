use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::{error::{AppError, Result}, models::work_log::WorkLog, validation::dates::DateRange};

const COLUMNS: &str = "id, employee_code, date, start_time, end_time, total_hours";

/// Persistence for work sessions (the "clock store").
///
/// Every method is a single statement, so each write is atomic on its own.
#[async_trait]
pub trait WorkLogStore: Send + Sync {
    /// Inserts an open session. Returns `None` when the employee already has an
    /// open session on `date`.
    async fn insert_open(
        &self,
        employee_code: &str,
        date: NaiveDate,
        start_time: DateTime<Utc>,
    ) -> Result<Option<WorkLog>>;

    /// The most recently started open session of the employee on `date`.
    async fn find_open(&self, employee_code: &str, date: NaiveDate) -> Result<Option<WorkLog>>;

    /// Closes the session if it is still open. Returns `None` if it was not.
    async fn close(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        total_hours: f64,
    ) -> Result<Option<WorkLog>>;

    /// Sessions of the employee, newest date first and, within a date, newest
    /// start first. `None` means no date filter.
    async fn list(&self, employee_code: &str, range: Option<DateRange>) -> Result<Vec<WorkLog>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkLog>>;

    /// Overwrites the timing columns of a session.
    async fn update_times(
        &self,
        id: Uuid,
        date: NaiveDate,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        total_hours: Option<f64>,
    ) -> Result<Option<WorkLog>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// PostgreSQL-backed [`WorkLogStore`].
#[derive(Clone)]
pub struct PgWorkLogStore {
    pool: Pool,
}

impl PgWorkLogStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkLogStore for PgWorkLogStore {
    async fn insert_open(
        &self,
        employee_code: &str,
        date: NaiveDate,
        start_time: DateTime<Utc>,
    ) -> Result<Option<WorkLog>> {
        let client = self.pool.get().await?;
        // ON CONFLICT targets the partial unique index on open sessions.
        let stmt = client
            .prepare_cached(&format!(
                "INSERT INTO work_logs (id, employee_code, date, start_time) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT DO NOTHING RETURNING {COLUMNS}"
            ))
            .await?;
        let row = client
            .query_opt(&stmt, &[&Uuid::new_v4(), &employee_code, &date, &start_time])
            .await?;
        Ok(row.as_ref().map(WorkLog::try_from).transpose()?)
    }

    async fn find_open(&self, employee_code: &str, date: NaiveDate) -> Result<Option<WorkLog>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "SELECT {COLUMNS} FROM work_logs \
                 WHERE employee_code = $1 AND date = $2 AND end_time IS NULL \
                 ORDER BY start_time DESC LIMIT 1"
            ))
            .await?;
        let row = client.query_opt(&stmt, &[&employee_code, &date]).await?;
        Ok(row.as_ref().map(WorkLog::try_from).transpose()?)
    }

    async fn close(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        total_hours: f64,
    ) -> Result<Option<WorkLog>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "UPDATE work_logs SET end_time = $2, total_hours = $3 \
                 WHERE id = $1 AND end_time IS NULL RETURNING {COLUMNS}"
            ))
            .await?;
        let row = client.query_opt(&stmt, &[&id, &end_time, &total_hours]).await?;
        Ok(row.as_ref().map(WorkLog::try_from).transpose()?)
    }

    async fn list(&self, employee_code: &str, range: Option<DateRange>) -> Result<Vec<WorkLog>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "SELECT {COLUMNS} FROM work_logs \
                 WHERE employee_code = $1 \
                   AND ($2::DATE IS NULL OR date >= $2) \
                   AND ($3::DATE IS NULL OR date <= $3) \
                 ORDER BY date DESC, start_time DESC"
            ))
            .await?;
        let start = range.map(|r| r.start());
        let end = range.map(|r| r.end());
        let rows = client.query(&stmt, &[&employee_code, &start, &end]).await?;
        Ok(rows.iter().map(WorkLog::try_from).collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkLog>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!("SELECT {COLUMNS} FROM work_logs WHERE id = $1"))
            .await?;
        let row = client.query_opt(&stmt, &[&id]).await?;
        Ok(row.as_ref().map(WorkLog::try_from).transpose()?)
    }

    async fn update_times(
        &self,
        id: Uuid,
        date: NaiveDate,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        total_hours: Option<f64>,
    ) -> Result<Option<WorkLog>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "UPDATE work_logs SET date = $2, start_time = $3, end_time = $4, total_hours = $5 \
                 WHERE id = $1 RETURNING {COLUMNS}"
            ))
            .await?;
        let row = client
            .query_opt(&stmt, &[&id, &date, &start_time, &end_time, &total_hours])
            .await
            .map_err(|e| {
                // Re-opening a session next to another open one on the same date.
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    AppError::DuplicateClockIn
                } else {
                    AppError::from(e)
                }
            })?;
        Ok(row.as_ref().map(WorkLog::try_from).transpose()?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("DELETE FROM work_logs WHERE id = $1")
            .await?;
        Ok(client.execute(&stmt, &[&id]).await? > 0)
    }
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::routine::RoutineTask,
};

const COLUMNS: &str = "id, employee_code, date, position, task, is_completed, completed_at";

/// Persistence for routine tasks.
#[async_trait]
pub trait RoutineStore: Send + Sync {
    /// Atomically replaces the employee's routine for `date` with `tasks`,
    /// in order, all incomplete.
    async fn replace(
        &self,
        employee_code: &str,
        date: NaiveDate,
        tasks: &[String],
    ) -> Result<Vec<RoutineTask>>;

    /// The routine for `date` in insertion order.
    async fn list(&self, employee_code: &str, date: NaiveDate) -> Result<Vec<RoutineTask>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RoutineTask>>;

    async fn set_completion(
        &self,
        id: Uuid,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<RoutineTask>>;
}

/// PostgreSQL-backed [`RoutineStore`].
#[derive(Clone)]
pub struct PgRoutineStore {
    pool: Pool,
}

impl PgRoutineStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoutineStore for PgRoutineStore {
    async fn replace(
        &self,
        employee_code: &str,
        date: NaiveDate,
        tasks: &[String],
    ) -> Result<Vec<RoutineTask>> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let removed = tx
            .execute(
                "DELETE FROM work_routines WHERE employee_code = $1 AND date = $2",
                &[&employee_code, &date],
            )
            .await?;

        let insert = tx
            .prepare_cached(&format!(
                "INSERT INTO work_routines (id, employee_code, date, position, task) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
            ))
            .await?;

        let mut created = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            let position = i32::try_from(index)
                .map_err(|_| AppError::Validation("Too many tasks".to_string()))?;
            let row = tx
                .query_one(&insert, &[&Uuid::new_v4(), &employee_code, &date, &position, task])
                .await?;
            created.push(RoutineTask::try_from(&row)?);
        }

        tx.commit().await?;
        tracing::debug!(
            "Routine replaced for {} on {}: {} removed, {} inserted",
            employee_code,
            date,
            removed,
            created.len()
        );

        Ok(created)
    }

    async fn list(&self, employee_code: &str, date: NaiveDate) -> Result<Vec<RoutineTask>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "SELECT {COLUMNS} FROM work_routines \
                 WHERE employee_code = $1 AND date = $2 ORDER BY position"
            ))
            .await?;
        let rows = client.query(&stmt, &[&employee_code, &date]).await?;
        Ok(rows
            .iter()
            .map(RoutineTask::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RoutineTask>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!("SELECT {COLUMNS} FROM work_routines WHERE id = $1"))
            .await?;
        let row = client.query_opt(&stmt, &[&id]).await?;
        Ok(row.as_ref().map(RoutineTask::try_from).transpose()?)
    }

    async fn set_completion(
        &self,
        id: Uuid,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<RoutineTask>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "UPDATE work_routines SET is_completed = $2, completed_at = $3 \
                 WHERE id = $1 RETURNING {COLUMNS}"
            ))
            .await?;
        let row = client.query_opt(&stmt, &[&id, &is_completed, &completed_at]).await?;
        Ok(row.as_ref().map(RoutineTask::try_from).transpose()?)
    }
}

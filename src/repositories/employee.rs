use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::{error::Result, models::employee::Employee};

const COLUMNS: &str = "code, name, hourly_rate, created_at";

/// Persistence for employees.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Inserts a new employee. Returns `None` if the code is already taken.
    async fn create(&self, code: &str, name: &str, hourly_rate: f64) -> Result<Option<Employee>>;

    /// Lists all employees, newest first.
    async fn list(&self) -> Result<Vec<Employee>>;

    async fn find(&self, code: &str) -> Result<Option<Employee>>;

    /// Replaces name and rate. Returns `None` if no such employee exists.
    async fn update(&self, code: &str, name: &str, hourly_rate: f64) -> Result<Option<Employee>>;

    /// Deletes an employee and, through the foreign keys, their sessions and tasks.
    async fn delete(&self, code: &str) -> Result<bool>;
}

/// PostgreSQL-backed [`EmployeeStore`].
#[derive(Clone)]
pub struct PgEmployeeStore {
    pool: Pool,
}

impl PgEmployeeStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for PgEmployeeStore {
    async fn create(&self, code: &str, name: &str, hourly_rate: f64) -> Result<Option<Employee>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "INSERT INTO employees (code, name, hourly_rate) VALUES ($1, $2, $3) \
                 ON CONFLICT (code) DO NOTHING RETURNING {COLUMNS}"
            ))
            .await?;
        let row = client.query_opt(&stmt, &[&code, &name, &hourly_rate]).await?;
        Ok(row.as_ref().map(Employee::try_from).transpose()?)
    }

    async fn list(&self) -> Result<Vec<Employee>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "SELECT {COLUMNS} FROM employees ORDER BY created_at DESC"
            ))
            .await?;
        let rows = client.query(&stmt, &[]).await?;
        Ok(rows.iter().map(Employee::try_from).collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn find(&self, code: &str) -> Result<Option<Employee>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!("SELECT {COLUMNS} FROM employees WHERE code = $1"))
            .await?;
        let row = client.query_opt(&stmt, &[&code]).await?;
        Ok(row.as_ref().map(Employee::try_from).transpose()?)
    }

    async fn update(&self, code: &str, name: &str, hourly_rate: f64) -> Result<Option<Employee>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "UPDATE employees SET name = $2, hourly_rate = $3 WHERE code = $1 RETURNING {COLUMNS}"
            ))
            .await?;
        let row = client.query_opt(&stmt, &[&code, &name, &hourly_rate]).await?;
        Ok(row.as_ref().map(Employee::try_from).transpose()?)
    }

    async fn delete(&self, code: &str) -> Result<bool> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached("DELETE FROM employees WHERE code = $1")
            .await?;
        Ok(client.execute(&stmt, &[&code]).await? > 0)
    }
}

use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::{error::Result, models::admin::Admin};

/// Persistence for admin accounts.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>>;

    /// Creates the account or replaces its password hash.
    async fn upsert(&self, username: &str, password_hash: &str) -> Result<Admin>;
}

/// PostgreSQL-backed [`AdminStore`].
#[derive(Clone)]
pub struct PgAdminStore {
    pool: Pool,
}

impl PgAdminStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                "SELECT username, password_hash FROM admins WHERE username = $1",
            )
            .await?;
        let row = client.query_opt(&stmt, &[&username]).await?;
        Ok(row.as_ref().map(Admin::try_from).transpose()?)
    }

    async fn upsert(&self, username: &str, password_hash: &str) -> Result<Admin> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO admins (username, password_hash) VALUES ($1, $2)
                ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash
                RETURNING username, password_hash
                "#,
            )
            .await?;
        let row = client.query_one(&stmt, &[&username, &password_hash]).await?;
        Ok(Admin::try_from(&row)?)
    }
}

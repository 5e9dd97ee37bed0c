use std::sync::Arc;

use crate::config::Config;
use crate::crypto::token::TokenService;
use crate::error::Result;
use crate::repositories::{
    admin::{AdminStore, PgAdminStore},
    employee::{EmployeeStore, PgEmployeeStore},
    routine::{PgRoutineStore, RoutineStore},
    work_log::{PgWorkLogStore, WorkLogStore},
};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Access-token signer and verifier.
    pub tokens: TokenService,
    /// Employee records.
    pub employees: Arc<dyn EmployeeStore>,
    /// Work sessions.
    pub work_logs: Arc<dyn WorkLogStore>,
    /// Routine tasks.
    pub routines: Arc<dyn RoutineStore>,
    /// Admin accounts.
    pub admins: Arc<dyn AdminStore>,
}

impl AppState {
    /// Creates a new `AppState` backed by PostgreSQL.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url, config.database_max_connections)?;
        crate::db::ensure_schema(&db).await?;
        tracing::info!(
            "✅ PostgreSQL pool initialized (max {} connections)",
            config.database_max_connections
        );

        Ok(Self::with_stores(
            config,
            Arc::new(PgEmployeeStore::new(db.clone())),
            Arc::new(PgWorkLogStore::new(db.clone())),
            Arc::new(PgRoutineStore::new(db.clone())),
            Arc::new(PgAdminStore::new(db)),
        ))
    }

    /// Creates an `AppState` over the given stores.
    pub fn with_stores(
        config: &Config,
        employees: Arc<dyn EmployeeStore>,
        work_logs: Arc<dyn WorkLogStore>,
        routines: Arc<dyn RoutineStore>,
        admins: Arc<dyn AdminStore>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours);
        tracing::info!("✅ Token service initialized ({}h lifetime)", config.token_ttl_hours);

        AppState {
            config: config.clone(),
            tokens,
            employees,
            work_logs,
            routines,
            admins,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over one shared in-memory store, for tests.
    pub fn in_memory() -> (Self, Arc<crate::repositories::memory::MemoryStore>) {
        let store = Arc::new(crate::repositories::memory::MemoryStore::default());
        let state = Self::with_stores(
            &Config::for_tests(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        (state, store)
    }
}

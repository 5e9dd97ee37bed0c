use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod response;
mod routes;
mod state;

mod crypto {
    pub mod password;
    pub mod token;
}

mod models {
    pub mod admin;
    pub mod employee;
    pub mod identity;
    pub mod routine;
    pub mod salary;
    pub mod work_log;
}

mod repositories {
    pub mod admin;
    pub mod employee;
    #[cfg(test)]
    pub mod memory;
    pub mod routine;
    pub mod work_log;
}

mod services {
    pub mod auth;
    pub mod employees;
    pub mod payroll;
    pub mod routines;
    pub mod time_accounting;
}

mod handlers {
    pub mod auth;
    pub mod employees;
    pub mod routines;
    pub mod salary;
    pub mod work;
}

mod middleware_layer {
    pub mod auth;
}

mod validation {
    pub mod auth;
    pub mod dates;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    if let Some(admin) = &config.bootstrap_admin {
        if let Err(e) = services::auth::ensure_bootstrap_admin(&state, admin).await {
            tracing::error!("❌ Failed to ensure bootstrap admin: {}", e);
            return Err(e.into());
        }
    } else {
        tracing::warn!("⚠️ No ADMIN_USERNAME/ADMIN_PASSWORD set, admin accounts must already exist");
    }

    let app = routes::create_router(state)?;

    let addr = config.bind_addr;
    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("✅ All systems operational");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

use std::fmt;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::Result,
    models::identity::Identity,
    response::json,
    services::auth as auth_service,
    state::AppState,
};

/// The request payload for admin login.
#[derive(Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[garde(length(min = 3, max = 64))]
    pub username: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// The request payload for employee login.
///
/// The code is the employee's only credential, so `Debug` never prints it.
#[derive(Deserialize, Validate)]
pub struct EmployeeLoginRequest {
    #[garde(length(min = 1, max = 32))]
    pub code: String,
}

impl fmt::Debug for EmployeeLoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmployeeLoginRequest")
            .field("code", &"<redacted>")
            .finish()
    }
}

/// Handles admin login.
#[axum::debug_handler]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Admin login attempt: {}", payload.username);
    payload.validate()?;

    let outcome =
        auth_service::login_admin(&state, &payload.username, &payload.password, Utc::now()).await?;
    json(StatusCode::OK, &outcome)
}

/// Handles employee login.
#[axum::debug_handler]
pub async fn employee_login(
    State(state): State<AppState>,
    Json(payload): Json<EmployeeLoginRequest>,
) -> Result<Response> {
    tracing::debug!("🔐 Employee login attempt - Payload: {:?}", payload);
    payload.validate()?;

    let outcome = auth_service::login_employee(&state, &payload.code, Utc::now()).await?;
    json(StatusCode::OK, &outcome)
}

/// Returns the identity carried by the caller's token.
pub async fn me(Extension(identity): Extension<Identity>) -> Result<Response> {
    json(StatusCode::OK, &identity)
}

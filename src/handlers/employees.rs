use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::Result,
    models::identity::Identity,
    response::json,
    services::employees as employee_service,
    state::AppState,
    validation::auth::normalize_employee_code,
};

/// The request payload for registering or updating an employee.
#[derive(Deserialize, Validate, Debug)]
pub struct EmployeeRequest {
    #[garde(length(min = 1, max = 200))]
    pub name: String,
    #[garde(range(min = 0.0))]
    pub hourly_rate: f64,
}

/// Lists all employees, newest first.
#[axum::debug_handler]
pub async fn list_employees(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response> {
    identity.require_admin()?;
    let employees = employee_service::list(&state).await?;
    json(StatusCode::OK, &employees)
}

/// Registers an employee under a generated code.
#[axum::debug_handler]
pub async fn create_employee(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<EmployeeRequest>,
) -> Result<Response> {
    let admin = identity.require_admin()?;
    tracing::info!("📝 {} registers employee - Payload: {:?}", admin, payload);
    payload.validate()?;

    let employee = employee_service::register(&state, &payload.name, payload.hourly_rate).await?;
    json(StatusCode::CREATED, &employee)
}

/// Returns one employee; employees may read their own record.
#[axum::debug_handler]
pub async fn get_employee(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
) -> Result<Response> {
    let code = normalize_employee_code(&code)?;
    identity.ensure_can_access(&code)?;

    let employee = employee_service::get(&state, &code).await?;
    json(StatusCode::OK, &employee)
}

#[axum::debug_handler]
pub async fn update_employee(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
    Json(payload): Json<EmployeeRequest>,
) -> Result<Response> {
    identity.require_admin()?;
    payload.validate()?;
    let code = normalize_employee_code(&code)?;

    let employee =
        employee_service::update(&state, &code, &payload.name, payload.hourly_rate).await?;
    json(StatusCode::OK, &employee)
}

/// Deletes an employee along with their sessions and tasks.
#[axum::debug_handler]
pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
) -> Result<StatusCode> {
    identity.require_admin()?;
    let code = normalize_employee_code(&code)?;

    employee_service::delete(&state, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use chrono::NaiveDate;
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::Result,
    models::identity::Identity,
    response::json,
    services::payroll,
    state::AppState,
    validation::{auth::normalize_employee_code, dates::DateRange},
};

/// The request payload for a salary calculation.
///
/// Without `hourly_rate` the employee's stored rate is used.
#[derive(Deserialize, Validate, Debug)]
pub struct SalaryRequest {
    #[garde(length(min = 1, max = 32))]
    pub employee_code: String,
    #[garde(skip)]
    pub start_date: NaiveDate,
    #[garde(skip)]
    pub end_date: NaiveDate,
    // Checked by the payroll service.
    #[garde(skip)]
    #[serde(default)]
    pub hourly_rate: Option<f64>,
}

/// Computes the salary of an employee over a date range.
#[axum::debug_handler]
pub async fn calculate_salary(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<SalaryRequest>,
) -> Result<Response> {
    identity.require_admin()?;
    tracing::info!("💰 Salary request - Payload: {:?}", payload);
    payload.validate()?;

    let code = normalize_employee_code(&payload.employee_code)?;
    let range = DateRange::new(payload.start_date, payload.end_date)?;

    let quote = match payload.hourly_rate {
        Some(rate) => payroll::calculate_salary(&state, &code, range, rate).await?,
        None => payroll::calculate_salary_for_employee(&state, &code, range).await?,
    };
    json(StatusCode::OK, &quote)
}

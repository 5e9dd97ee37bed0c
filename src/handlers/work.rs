use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        identity::Identity,
        work_log::{WorkLogSummary, WorkLogView},
    },
    response::json,
    services::time_accounting,
    state::AppState,
    validation::{auth::normalize_employee_code, dates::resolve_range},
};

/// The query parameters for listing work logs.
///
/// Either `start_date` + `end_date`, or `year` + `month`, or nothing.
#[derive(Deserialize)]
pub struct WorkLogQuery {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
}

/// The request payload for correcting a session.
#[derive(Deserialize)]
pub struct EditSessionRequest {
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct WorkLogsResponse {
    logs: Vec<WorkLogView>,
    summary: WorkLogSummary,
}

/// Clocks the calling employee in.
#[axum::debug_handler]
pub async fn clock_in(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response> {
    let code = identity.require_employee()?;
    let log = time_accounting::clock_in(&state, code, Utc::now()).await?;
    json(StatusCode::CREATED, &WorkLogView::from(log))
}

/// Clocks the calling employee out.
#[axum::debug_handler]
pub async fn clock_out(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response> {
    let code = identity.require_employee()?;
    let log = time_accounting::clock_out(&state, code, Utc::now()).await?;
    json(StatusCode::OK, &WorkLogView::from(log))
}

/// Today's sessions and live status of the calling employee.
#[axum::debug_handler]
pub async fn today(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response> {
    let code = identity.require_employee()?;
    let view = time_accounting::today(&state, code, Utc::now()).await?;
    json(StatusCode::OK, &view)
}

/// Lists the sessions of one employee with a summary.
#[axum::debug_handler]
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
    Query(query): Query<WorkLogQuery>,
) -> Result<Response> {
    let code = normalize_employee_code(&code)?;
    identity.ensure_can_access(&code)?;
    let range = resolve_range(query.start_date, query.end_date, query.year, query.month)?;

    let logs = time_accounting::list_sessions(&state, &code, range).await?;
    let summary = time_accounting::summarize(&logs);
    tracing::debug!("Listed {} sessions for {}", logs.len(), code);

    json(
        StatusCode::OK,
        &WorkLogsResponse {
            logs: logs.into_iter().map(WorkLogView::from).collect(),
            summary,
        },
    )
}

/// Corrects the times of a session.
#[axum::debug_handler]
pub async fn edit_session(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditSessionRequest>,
) -> Result<Response> {
    identity.require_admin()?;
    let log =
        time_accounting::edit_session(&state, id, payload.start_time, payload.end_time).await?;
    json(StatusCode::OK, &WorkLogView::from(log))
}

#[axum::debug_handler]
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    identity.require_admin()?;
    time_accounting::delete_session(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

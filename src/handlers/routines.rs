use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::{NaiveDate, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        identity::Identity,
        routine::{Progress, RoutineTask},
    },
    response::json,
    services::routines as routine_service,
    state::AppState,
    validation::auth::normalize_employee_code,
};

/// The request payload for setting a routine.
#[derive(Deserialize, Validate)]
pub struct SetRoutineRequest {
    // Emptiness is reported as its own error by the service.
    #[garde(inner(length(min = 1, max = 500)))]
    pub tasks: Vec<String>,
}

/// The request payload for checking a task on or off.
#[derive(Deserialize)]
pub struct CompletionRequest {
    pub is_completed: bool,
}

#[derive(Serialize)]
struct RoutineResponse {
    employee_code: String,
    date: NaiveDate,
    tasks: Vec<RoutineTask>,
    progress: Progress,
}

impl RoutineResponse {
    fn new(employee_code: String, date: NaiveDate, tasks: Vec<RoutineTask>) -> Self {
        let progress = routine_service::progress_of(&tasks);
        Self { employee_code, date, tasks, progress }
    }
}

/// Replaces the routine of an employee for a date.
#[axum::debug_handler]
pub async fn set_routine(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((code, date)): Path<(String, NaiveDate)>,
    Json(payload): Json<SetRoutineRequest>,
) -> Result<Response> {
    identity.require_admin()?;
    payload.validate()?;
    let code = normalize_employee_code(&code)?;

    let tasks = routine_service::set_routines(&state, &code, date, payload.tasks).await?;
    json(StatusCode::CREATED, &RoutineResponse::new(code, date, tasks))
}

#[axum::debug_handler]
pub async fn get_routine(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((code, date)): Path<(String, NaiveDate)>,
) -> Result<Response> {
    let code = normalize_employee_code(&code)?;
    identity.ensure_can_access(&code)?;

    let tasks = routine_service::list_routine(&state, &code, date).await?;
    json(StatusCode::OK, &RoutineResponse::new(code, date, tasks))
}

#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((code, date)): Path<(String, NaiveDate)>,
) -> Result<Response> {
    let code = normalize_employee_code(&code)?;
    identity.ensure_can_access(&code)?;

    let progress = routine_service::progress(&state, &code, date).await?;
    json(StatusCode::OK, &progress)
}

/// Checks a task on or off for its owner.
#[axum::debug_handler]
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<CompletionRequest>,
) -> Result<Response> {
    let task = routine_service::set_completion(
        &state,
        &identity,
        task_id,
        payload.is_completed,
        Utc::now(),
    )
    .await?;
    json(StatusCode::OK, &task)
}

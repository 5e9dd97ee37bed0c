use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::identity::Identity;
use crate::models::routine::{Progress, RoutineTask};
use crate::state::AppState;

/// Replaces the employee's routine for `date` with `tasks`, in order.
///
/// Prior tasks for that date are dropped together with their completion
/// state. Blank descriptions are rejected along with an empty list.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `employee_code` - The employee receiving the routine.
/// * `date` - The calendar date of the routine.
/// * `tasks` - Task descriptions in display order.
///
/// # Returns
///
/// A `Result` containing the newly stored tasks.
pub async fn set_routines(
    state: &AppState,
    employee_code: &str,
    date: NaiveDate,
    tasks: Vec<String>,
) -> Result<Vec<RoutineTask>> {
    if tasks.is_empty() {
        return Err(AppError::EmptyTaskList);
    }
    let tasks: Vec<String> = tasks.into_iter().map(|t| t.trim().to_string()).collect();
    if tasks.iter().any(String::is_empty) {
        return Err(AppError::Validation("Task description cannot be empty".to_string()));
    }

    state
        .employees
        .find(employee_code)
        .await?
        .ok_or(AppError::NotFound("Employee"))?;

    let stored = state.routines.replace(employee_code, date, &tasks).await?;
    tracing::info!("📋 Routine for {} on {} set to {} tasks", employee_code, date, stored.len());
    Ok(stored)
}

pub async fn list_routine(
    state: &AppState,
    employee_code: &str,
    date: NaiveDate,
) -> Result<Vec<RoutineTask>> {
    state.routines.list(employee_code, date).await
}

/// Completion figures of a routine. An empty routine is 0%.
pub fn progress_of(tasks: &[RoutineTask]) -> Progress {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.is_completed).count();
    let percentage = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u32
    };
    Progress { total, completed, percentage }
}

pub async fn progress(state: &AppState, employee_code: &str, date: NaiveDate) -> Result<Progress> {
    let tasks = state.routines.list(employee_code, date).await?;
    Ok(progress_of(&tasks))
}

/// Checks a task on or off for the employee that owns it.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `identity` - The caller; must be the employee owning the task.
/// * `task_id` - The task to toggle.
/// * `completed` - The new completion flag.
/// * `now` - Stamped as `completed_at` when checking on.
///
/// # Returns
///
/// A `Result` containing the updated task.
pub async fn set_completion(
    state: &AppState,
    identity: &Identity,
    task_id: Uuid,
    completed: bool,
    now: DateTime<Utc>,
) -> Result<RoutineTask> {
    let code = identity.require_employee()?;
    let task = state
        .routines
        .find_by_id(task_id)
        .await?
        .ok_or(AppError::NotFound("Task"))?;

    if task.employee_code != code {
        tracing::warn!("🚫 {} tried to toggle task {} of {}", code, task_id, task.employee_code);
        return Err(AppError::Unauthorized(
            "Task belongs to another employee".to_string(),
        ));
    }

    let completed_at = completed.then_some(now);
    let updated = state
        .routines
        .set_completion(task_id, completed, completed_at)
        .await?
        .ok_or(AppError::NotFound("Task"))?;

    tracing::debug!("Task {} of {} marked completed={}", task_id, code, completed);
    Ok(updated)
}

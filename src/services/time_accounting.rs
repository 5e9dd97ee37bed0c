use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::work_log::{DayStatus, WorkLog, WorkLogSummary, WorkLogView, round2};
use crate::state::AppState;
use crate::validation::dates::{DateRange, calendar_date};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Today's sessions of one employee, as shown on the clock screen.
#[derive(Debug, Clone, Serialize)]
pub struct TodayView {
    pub date: chrono::NaiveDate,
    pub status: DayStatus,
    /// Live hours of the open session, or the stored hours of the latest
    /// closed one.
    pub elapsed_hours: Option<f64>,
    pub sessions: Vec<WorkLogView>,
}

/// Fractional hours from `start` to `end`, keeping the sign.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Elapsed hours of a session.
///
/// Open sessions are measured against `as_of`; closed sessions report their
/// stored value whatever `as_of` is.
pub fn elapsed_hours(log: &WorkLog, as_of: DateTime<Utc>) -> f64 {
    match (log.end_time, log.total_hours) {
        (Some(_), Some(hours)) => hours,
        (Some(end), None) => hours_between(log.start_time, end),
        (None, _) => hours_between(log.start_time, as_of),
    }
}

async fn ensure_employee(state: &AppState, employee_code: &str) -> Result<()> {
    state
        .employees
        .find(employee_code)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("Employee"))
}

/// Opens a work session for the employee at `now`.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `employee_code` - The employee clocking in.
/// * `now` - The clock-in instant.
///
/// # Returns
///
/// A `Result` containing the new open `WorkLog`, or `DuplicateClockIn` if the
/// employee already has an open session today.
pub async fn clock_in(state: &AppState, employee_code: &str, now: DateTime<Utc>) -> Result<WorkLog> {
    ensure_employee(state, employee_code).await?;

    let date = calendar_date(now);
    let log = state
        .work_logs
        .insert_open(employee_code, date, now)
        .await?
        .ok_or(AppError::DuplicateClockIn)?;

    tracing::info!("⏱️ {} clocked in on {} (session {})", employee_code, date, log.id);
    Ok(log)
}

/// Closes the latest open session of today for the employee.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `employee_code` - The employee clocking out.
/// * `now` - The clock-out instant.
///
/// # Returns
///
/// A `Result` containing the closed `WorkLog`. Fails with `NoOpenSession` when
/// nothing is open today, and with `ConcurrentModification` when another
/// request closed the session first.
pub async fn clock_out(state: &AppState, employee_code: &str, now: DateTime<Utc>) -> Result<WorkLog> {
    let date = calendar_date(now);
    let open = state
        .work_logs
        .find_open(employee_code, date)
        .await?
        .ok_or(AppError::NoOpenSession)?;

    let closed = close_session(state, &open, now).await?;
    tracing::info!(
        "⏱️ {} clocked out, {:.2}h recorded",
        employee_code,
        closed.total_hours.unwrap_or_default()
    );
    Ok(closed)
}

/// Closes `open` at `now` unless another request closed it first.
async fn close_session(state: &AppState, open: &WorkLog, now: DateTime<Utc>) -> Result<WorkLog> {
    let hours = hours_between(open.start_time, now);
    if hours < 0.0 {
        tracing::warn!(
            "Session {} closes before it started ({:.4}h), storing as-is",
            open.id,
            hours
        );
    }

    state
        .work_logs
        .close(open.id, now, hours)
        .await?
        .ok_or_else(|| {
            AppError::ConcurrentModification(format!("Session {} was already closed", open.id))
        })
}

/// Sessions of an employee, optionally restricted to a date range.
pub async fn list_sessions(
    state: &AppState,
    employee_code: &str,
    range: Option<DateRange>,
) -> Result<Vec<WorkLog>> {
    ensure_employee(state, employee_code).await?;
    state.work_logs.list(employee_code, range).await
}

pub fn summarize(logs: &[WorkLog]) -> WorkLogSummary {
    let mut dates: Vec<_> = logs.iter().map(|l| l.date).collect();
    dates.sort_unstable();
    dates.dedup();

    let open_sessions = logs.iter().filter(|l| l.is_open()).count();
    let total_hours: f64 = logs.iter().filter_map(|l| l.total_hours).sum();

    WorkLogSummary {
        total_sessions: logs.len(),
        working_days: dates.len(),
        completed_sessions: logs.len() - open_sessions,
        open_sessions,
        total_hours: round2(total_hours),
    }
}

/// Builds the clock screen for the employee at `now`.
pub async fn today(state: &AppState, employee_code: &str, now: DateTime<Utc>) -> Result<TodayView> {
    let date = calendar_date(now);
    let range = DateRange::new(date, date)?;
    let sessions = state.work_logs.list(employee_code, Some(range)).await?;

    // Sessions come newest first.
    let (status, elapsed) = match sessions.first() {
        None => (DayStatus::NotStarted, None),
        Some(latest) if latest.is_open() => (DayStatus::Working, Some(elapsed_hours(latest, now))),
        Some(latest) => (DayStatus::Completed, Some(elapsed_hours(latest, now))),
    };

    Ok(TodayView {
        date,
        status,
        elapsed_hours: elapsed.map(round2),
        sessions: sessions.into_iter().map(WorkLogView::from).collect(),
    })
}

/// Rewrites the start and end of a session and recomputes its hours.
///
/// A `None` end re-opens the session. The calendar date follows the new start.
/// An end before the start is rejected.
pub async fn edit_session(
    state: &AppState,
    id: Uuid,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
) -> Result<WorkLog> {
    let current = state
        .work_logs
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Work session"))?;

    if end_time.is_some_and(|end| end < start_time) {
        return Err(AppError::Validation(
            "end_time cannot be before start_time".to_string(),
        ));
    }

    let hours = end_time.map(|end| hours_between(start_time, end));
    let updated = state
        .work_logs
        .update_times(id, calendar_date(start_time), start_time, end_time, hours)
        .await?
        .ok_or(AppError::NotFound("Work session"))?;

    tracing::info!(
        "✏️ Session {} of {} corrected ({:?}h, was {:?}h)",
        id,
        current.employee_code,
        hours,
        current.total_hours
    );
    Ok(updated)
}

pub async fn delete_session(state: &AppState, id: Uuid) -> Result<()> {
    if !state.work_logs.delete(id).await? {
        return Err(AppError::NotFound("Work session"));
    }
    tracing::info!("🗑️ Session {} deleted", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    async fn state_with_employee(code: &str) -> (AppState, std::sync::Arc<crate::repositories::memory::MemoryStore>) {
        let (state, store) = AppState::in_memory();
        state.employees.create(code, "Kim", 15000.0).await.unwrap();
        (state, store)
    }

    #[tokio::test]
    async fn clock_in_then_out_records_two_and_a_half_hours() {
        let (state, _) = state_with_employee("ABC123").await;

        let opened = clock_in(&state, "ABC123", t0()).await.unwrap();
        assert!(opened.is_open());
        assert_eq!(opened.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        let closed = clock_out(&state, "ABC123", t0() + Duration::minutes(150))
            .await
            .unwrap();
        assert_eq!(closed.id, opened.id);
        assert_eq!(closed.total_hours, Some(2.5));
    }

    #[tokio::test]
    async fn clock_out_without_open_session_changes_nothing() {
        let (state, store) = state_with_employee("ABC123").await;

        let err = clock_out(&state, "ABC123", t0()).await.unwrap_err();
        assert!(matches!(err, AppError::NoOpenSession));
        assert!(store.work_logs().is_empty());
    }

    #[tokio::test]
    async fn second_clock_in_while_open_is_rejected() {
        let (state, store) = state_with_employee("ABC123").await;

        clock_in(&state, "ABC123", t0()).await.unwrap();
        let err = clock_in(&state, "ABC123", t0() + Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateClockIn));
        assert_eq!(store.work_logs().len(), 1);
    }

    #[tokio::test]
    async fn next_shift_may_start_after_clock_out() {
        let (state, _) = state_with_employee("ABC123").await;

        clock_in(&state, "ABC123", t0()).await.unwrap();
        clock_out(&state, "ABC123", t0() + Duration::hours(4)).await.unwrap();
        clock_in(&state, "ABC123", t0() + Duration::hours(5)).await.unwrap();
        let second = clock_out(&state, "ABC123", t0() + Duration::hours(8))
            .await
            .unwrap();
        assert_eq!(second.total_hours, Some(3.0));

        let logs = list_sessions(&state, "ABC123", None).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, second.id);

        // Nothing left open to close.
        let err = clock_out(&state, "ABC123", t0() + Duration::hours(9))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoOpenSession));
    }

    #[tokio::test]
    async fn unknown_employee_cannot_clock_in() {
        let (state, _) = AppState::in_memory();
        let err = clock_in(&state, "NOPE0000", t0()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Employee")));
    }

    #[tokio::test]
    async fn backwards_clock_is_stored_signed() {
        let (state, store) = state_with_employee("ABC123").await;
        let start = t0() + Duration::minutes(30);
        store.seed_work_log(WorkLog {
            id: Uuid::new_v4(),
            employee_code: "ABC123".to_string(),
            date: calendar_date(start),
            start_time: start,
            end_time: None,
            total_hours: None,
        });

        let closed = clock_out(&state, "ABC123", t0()).await.unwrap();
        assert_eq!(closed.total_hours, Some(-0.5));
        assert_eq!(WorkLogView::from(closed).display_hours, Some(0.5));
    }

    #[test]
    fn hours_keep_sub_minute_precision() {
        let hours = hours_between(t0(), t0() + Duration::seconds(90));
        assert!((hours - 0.025).abs() < 1e-12);
    }

    #[test]
    fn closed_session_hours_ignore_as_of() {
        let log = WorkLog {
            id: Uuid::new_v4(),
            employee_code: "ABC123".to_string(),
            date: calendar_date(t0()),
            start_time: t0(),
            end_time: Some(t0() + Duration::hours(3)),
            total_hours: Some(3.0),
        };
        assert_eq!(elapsed_hours(&log, t0()), 3.0);
        assert_eq!(elapsed_hours(&log, t0() + Duration::days(30)), 3.0);

        let open = WorkLog { end_time: None, total_hours: None, ..log };
        assert_eq!(elapsed_hours(&open, t0() + Duration::minutes(45)), 0.75);
    }

    #[tokio::test]
    async fn today_reports_status_and_live_hours() {
        let (state, _) = state_with_employee("ABC123").await;

        let view = today(&state, "ABC123", t0()).await.unwrap();
        assert_eq!(view.status, DayStatus::NotStarted);
        assert!(view.elapsed_hours.is_none());

        clock_in(&state, "ABC123", t0()).await.unwrap();
        let view = today(&state, "ABC123", t0() + Duration::minutes(90)).await.unwrap();
        assert_eq!(view.status, DayStatus::Working);
        assert_eq!(view.elapsed_hours, Some(1.5));

        clock_out(&state, "ABC123", t0() + Duration::hours(2)).await.unwrap();
        let view = today(&state, "ABC123", t0() + Duration::hours(5)).await.unwrap();
        assert_eq!(view.status, DayStatus::Completed);
        assert_eq!(view.elapsed_hours, Some(2.0));
    }

    #[tokio::test]
    async fn summary_counts_days_and_open_sessions() {
        let (state, _) = state_with_employee("ABC123").await;
        let day2 = t0() + Duration::days(1);

        clock_in(&state, "ABC123", t0()).await.unwrap();
        clock_out(&state, "ABC123", t0() + Duration::minutes(100)).await.unwrap();
        clock_in(&state, "ABC123", t0() + Duration::hours(3)).await.unwrap();
        clock_out(&state, "ABC123", t0() + Duration::hours(4)).await.unwrap();
        clock_in(&state, "ABC123", day2).await.unwrap();

        let logs = list_sessions(&state, "ABC123", None).await.unwrap();
        let summary = summarize(&logs);
        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.working_days, 2);
        assert_eq!(summary.completed_sessions, 2);
        assert_eq!(summary.open_sessions, 1);
        assert_eq!(summary.total_hours, 2.67);
    }

    #[tokio::test]
    async fn editing_recomputes_hours_and_can_reopen() {
        let (state, _) = state_with_employee("ABC123").await;
        let opened = clock_in(&state, "ABC123", t0()).await.unwrap();
        clock_out(&state, "ABC123", t0() + Duration::hours(1)).await.unwrap();

        let edited = edit_session(&state, opened.id, t0(), Some(t0() + Duration::hours(6)))
            .await
            .unwrap();
        assert_eq!(edited.total_hours, Some(6.0));

        let reopened = edit_session(&state, opened.id, t0() - Duration::days(1), None)
            .await
            .unwrap();
        assert!(reopened.is_open());
        assert_eq!(reopened.total_hours, None);
        assert_eq!(reopened.date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());

        delete_session(&state, opened.id).await.unwrap();
        assert!(matches!(
            delete_session(&state, opened.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn losing_a_close_race_is_a_concurrent_modification() {
        let (state, store) = state_with_employee("ABC123").await;
        let opened = clock_in(&state, "ABC123", t0()).await.unwrap();

        let winner = state
            .work_logs
            .close(opened.id, t0() + Duration::hours(1), 1.0)
            .await
            .unwrap();
        assert_eq!(winner.unwrap().total_hours, Some(1.0));

        let err = close_session(&state, &opened, t0() + Duration::hours(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConcurrentModification(_)));
        assert_eq!(store.work_logs()[0].total_hours, Some(1.0));
    }

    #[tokio::test]
    async fn correction_rejects_end_before_start_and_unknown_sessions() {
        let (state, store) = state_with_employee("ABC123").await;
        let opened = clock_in(&state, "ABC123", t0()).await.unwrap();

        let err = edit_session(&state, opened.id, t0(), Some(t0() - Duration::minutes(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.work_logs()[0].is_open());

        let err = edit_session(&state, Uuid::new_v4(), t0(), None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Work session")));
    }

    #[tokio::test]
    async fn reopening_next_to_an_open_session_is_a_duplicate() {
        let (state, _) = state_with_employee("ABC123").await;
        let first = clock_in(&state, "ABC123", t0()).await.unwrap();
        clock_out(&state, "ABC123", t0() + Duration::hours(2)).await.unwrap();
        clock_in(&state, "ABC123", t0() + Duration::hours(3)).await.unwrap();

        let err = edit_session(&state, first.id, t0(), None).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateClockIn));
        let logs = list_sessions(&state, "ABC123", None).await.unwrap();
        assert_eq!(logs.iter().filter(|l| l.is_open()).count(), 1);
    }

    #[tokio::test]
    async fn shift_across_utc_midnight_is_closed_by_correction() {
        let (state, _) = state_with_employee("ABC123").await;
        let start = Utc.with_ymd_and_hms(2024, 3, 3, 23, 30, 0).unwrap();
        let opened = clock_in(&state, "ABC123", start).await.unwrap();

        let err = clock_out(&state, "ABC123", start + Duration::hours(9))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoOpenSession));

        let fixed = edit_session(&state, opened.id, start, Some(start + Duration::hours(9)))
            .await
            .unwrap();
        assert_eq!(fixed.total_hours, Some(9.0));
        assert_eq!(fixed.date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
    }
}

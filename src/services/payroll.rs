use crate::error::{AppError, Result};
use crate::models::employee::Employee;
use crate::models::salary::SalaryQuote;
use crate::state::AppState;
use crate::validation::dates::DateRange;

/// Computes the salary of an employee over `range` at an explicit rate.
///
/// Only closed sessions contribute. Hours are summed without rounding and the
/// product is returned unrounded.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `employee_code` - The employee being paid.
/// * `range` - Inclusive range of calendar dates.
/// * `hourly_rate` - Non-negative pay per hour.
///
/// # Returns
///
/// A `Result` containing the `SalaryQuote`, or `NotFound` when the employee
/// does not exist.
pub async fn calculate_salary(
    state: &AppState,
    employee_code: &str,
    range: DateRange,
    hourly_rate: f64,
) -> Result<SalaryQuote> {
    if !hourly_rate.is_finite() || hourly_rate < 0.0 {
        return Err(AppError::Validation(
            "hourly_rate must be a non-negative number".to_string(),
        ));
    }

    let employee = find_employee(state, employee_code).await?;
    quote(state, &employee.code, range, hourly_rate).await
}

/// Computes the salary using the rate stored on the employee record.
pub async fn calculate_salary_for_employee(
    state: &AppState,
    employee_code: &str,
    range: DateRange,
) -> Result<SalaryQuote> {
    let employee = find_employee(state, employee_code).await?;
    quote(state, &employee.code, range, employee.hourly_rate).await
}

async fn find_employee(state: &AppState, employee_code: &str) -> Result<Employee> {
    state
        .employees
        .find(employee_code)
        .await?
        .ok_or(AppError::NotFound("Employee"))
}

async fn quote(
    state: &AppState,
    employee_code: &str,
    range: DateRange,
    hourly_rate: f64,
) -> Result<SalaryQuote> {
    let logs = state.work_logs.list(employee_code, Some(range)).await?;
    let closed: Vec<f64> = logs.iter().filter_map(|l| l.total_hours).collect();
    let total_hours: f64 = closed.iter().sum();
    let salary = total_hours * hourly_rate;

    tracing::info!(
        "💰 Salary for {} ({} to {}): {} sessions, {}h x {} = {}",
        employee_code,
        range.start(),
        range.end(),
        closed.len(),
        total_hours,
        hourly_rate,
        salary
    );

    Ok(SalaryQuote {
        employee_code: employee_code.to_string(),
        start_date: range.start(),
        end_date: range.end(),
        session_count: closed.len(),
        total_hours,
        hourly_rate,
        salary,
    })
}

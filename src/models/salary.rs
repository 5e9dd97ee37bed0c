use chrono::NaiveDate;
use serde::Serialize;

/// A payroll figure computed on request; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryQuote {
    pub employee_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Number of closed sessions that contributed.
    pub session_count: usize,
    pub total_hours: f64,
    pub hourly_rate: f64,
    /// `total_hours * hourly_rate`, unrounded.
    pub salary: f64,
}

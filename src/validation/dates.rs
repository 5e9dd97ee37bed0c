use chrono::{DateTime, Months, NaiveDate, Utc};

use crate::error::{AppError, Result};

/// An inclusive range of calendar dates with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(AppError::Validation(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The whole calendar month `year-month`.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// The calendar date used to bucket an instant. Always the UTC date.
pub fn calendar_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Resolves the optional filters of a log query into a range.
///
/// Explicit dates win over `year`/`month`; a lone `year` or `month` is an error.
pub fn resolve_range(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Option<DateRange>> {
    match (start_date, end_date, year, month) {
        (Some(start), Some(end), _, _) => DateRange::new(start, end).map(Some),
        (Some(_), None, _, _) | (None, Some(_), _, _) => Err(AppError::Validation(
            "start_date and end_date must be given together".to_string(),
        )),
        (None, None, Some(year), Some(month)) => DateRange::month(year, month).map(Some),
        (None, None, None, None) => Ok(None),
        (None, None, _, _) => Err(AppError::Validation(
            "year and month must be given together".to_string(),
        )),
    }
}

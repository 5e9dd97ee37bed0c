use rand::Rng;

use crate::error::{AppError, Result};
use crate::models::employee::Employee;
use crate::state::AppState;

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CODE_LENGTH: usize = 8;
const MAX_CODE_ATTEMPTS: usize = 5;

/// A fresh 8-character uppercase base-36 employee code.
fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

fn validate_profile(name: &str, hourly_rate: f64) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }
    if !hourly_rate.is_finite() || hourly_rate < 0.0 {
        return Err(AppError::Validation(
            "hourly_rate must be a non-negative number".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Registers an employee under a server-generated code.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `name` - Display name.
/// * `hourly_rate` - Non-negative pay per hour.
///
/// # Returns
///
/// A `Result` containing the created `Employee`.
pub async fn register(state: &AppState, name: &str, hourly_rate: f64) -> Result<Employee> {
    let name = validate_profile(name, hourly_rate)?;

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = generate_code();
        if let Some(employee) = state.employees.create(&code, &name, hourly_rate).await? {
            tracing::info!("✅ Employee registered: {} ({})", employee.code, employee.name);
            return Ok(employee);
        }
        tracing::debug!("Employee code collision on attempt {}", attempt);
    }

    Err(AppError::Internal(
        "Could not allocate a unique employee code".to_string(),
    ))
}

pub async fn list(state: &AppState) -> Result<Vec<Employee>> {
    state.employees.list().await
}

pub async fn get(state: &AppState, code: &str) -> Result<Employee> {
    state
        .employees
        .find(code)
        .await?
        .ok_or(AppError::NotFound("Employee"))
}

pub async fn update(state: &AppState, code: &str, name: &str, hourly_rate: f64) -> Result<Employee> {
    let name = validate_profile(name, hourly_rate)?;
    let employee = state
        .employees
        .update(code, &name, hourly_rate)
        .await?
        .ok_or(AppError::NotFound("Employee"))?;
    tracing::info!("✏️ Employee {} updated", code);
    Ok(employee)
}

/// Deletes the employee together with their sessions and tasks.
pub async fn delete(state: &AppState, code: &str) -> Result<()> {
    if !state.employees.delete(code).await? {
        return Err(AppError::NotFound("Employee"));
    }
    tracing::info!("🗑️ Employee {} deleted", code);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::time_accounting;
    use chrono::Utc;

    #[test]
    fn generated_codes_are_uppercase_base36() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[tokio::test]
    async fn register_update_and_delete() {
        let (state, _) = AppState::in_memory();
        let created = register(&state, "  Kim  ", 12.5).await.unwrap();
        assert_eq!(created.name, "Kim");

        let updated = update(&state, &created.code, "Kim Lee", 14.0).await.unwrap();
        assert_eq!(updated.hourly_rate, 14.0);
        assert_eq!(get(&state, &created.code).await.unwrap().name, "Kim Lee");

        delete(&state, &created.code).await.unwrap();
        assert!(matches!(
            get(&state, &created.code).await,
            Err(AppError::NotFound("Employee"))
        ));
    }

    #[tokio::test]
    async fn rejects_blank_name_and_negative_rate() {
        let (state, _) = AppState::in_memory();
        assert!(matches!(register(&state, " ", 1.0).await, Err(AppError::Validation(_))));
        assert!(matches!(register(&state, "Kim", -0.5).await, Err(AppError::Validation(_))));
        assert!(list(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_to_sessions() {
        let (state, store) = AppState::in_memory();
        let kim = register(&state, "Kim", 10.0).await.unwrap();
        time_accounting::clock_in(&state, &kim.code, Utc::now()).await.unwrap();
        assert_eq!(store.work_logs().len(), 1);

        delete(&state, &kim.code).await.unwrap();
        assert!(store.work_logs().is_empty());
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::BootstrapAdmin;
use crate::crypto::password::{hash_password, verify_password};
use crate::crypto::token::IssuedToken;
use crate::error::{AppError, Result};
use crate::models::employee::Employee;
use crate::models::identity::Identity;
use crate::state::AppState;
use crate::validation::auth::{normalize_employee_code, validate_password, validate_username};

const INVALID_ADMIN_CREDENTIALS: &str = "Invalid username or password";

/// What a successful login hands back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub identity: Identity,
}

impl LoginOutcome {
    fn new(issued: IssuedToken, identity: Identity) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            identity,
        }
    }
}

/// Authenticates an admin by username and password.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `username` - The admin's username.
/// * `password` - The admin's password.
/// * `now` - The instant the token is issued at.
///
/// # Returns
///
/// A `Result` containing the token and the admin identity.
pub async fn login_admin(
    state: &AppState,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<LoginOutcome> {
    tracing::debug!("🔐 Admin login attempt: {}", username);

    let admin = state
        .admins
        .find_by_username(username)
        .await?
        .ok_or_else(|| AppError::Authentication(INVALID_ADMIN_CREDENTIALS.to_string()))?;

    if !verify_password(password, &admin.password_hash)? {
        return Err(AppError::Authentication(INVALID_ADMIN_CREDENTIALS.to_string()));
    }

    let identity = Identity::Admin { username: admin.username };
    let issued = state.tokens.issue(&identity, now)?;
    tracing::info!("✅ Admin logged in: {}", username);
    Ok(LoginOutcome::new(issued, identity))
}

/// Authenticates an employee by their code.
pub async fn login_employee(state: &AppState, code: &str, now: DateTime<Utc>) -> Result<LoginOutcome> {
    let code = normalize_employee_code(code)?;

    let Employee { code, name, .. } = state
        .employees
        .find(&code)
        .await?
        .ok_or_else(|| AppError::Authentication("Unknown employee code".to_string()))?;

    tracing::info!("✅ Employee logged in: {}", name);
    let identity = Identity::Employee { code, name };
    let issued = state.tokens.issue(&identity, now)?;
    Ok(LoginOutcome::new(issued, identity))
}

/// Creates the configured admin account, or resets its password.
pub async fn ensure_bootstrap_admin(state: &AppState, admin: &BootstrapAdmin) -> Result<()> {
    validate_username(&admin.username)?;
    validate_password(&admin.password)?;

    let hash = hash_password(&admin.password)?;
    state.admins.upsert(&admin.username, &hash).await?;
    tracing::info!("✅ Bootstrap admin ensured: {}", admin.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroizing;

    fn bootstrap() -> BootstrapAdmin {
        BootstrapAdmin {
            username: "boss".to_string(),
            password: Zeroizing::new("correct horse".to_string()),
        }
    }

    #[tokio::test]
    async fn admin_login_checks_the_hash() {
        let (state, _) = AppState::in_memory();
        ensure_bootstrap_admin(&state, &bootstrap()).await.unwrap();

        let ok = login_admin(&state, "boss", "correct horse", Utc::now()).await.unwrap();
        assert_eq!(state.tokens.verify(&ok.token).unwrap(), ok.identity);
        assert_eq!(ok.identity, Identity::Admin { username: "boss".to_string() });

        let bad = login_admin(&state, "boss", "wrong horse", Utc::now()).await;
        assert!(matches!(bad, Err(AppError::Authentication(_))));
        let unknown = login_admin(&state, "nobody", "correct horse", Utc::now()).await;
        assert!(matches!(unknown, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn employee_login_normalises_the_code() {
        let (state, _) = AppState::in_memory();
        state.employees.create("ABC123", "Kim", 10.0).await.unwrap();

        let ok = login_employee(&state, " abc123 ", Utc::now()).await.unwrap();
        assert_eq!(
            ok.identity,
            Identity::Employee { code: "ABC123".to_string(), name: "Kim".to_string() }
        );

        assert!(matches!(
            login_employee(&state, "ZZZ999", Utc::now()).await,
            Err(AppError::Authentication(_))
        ));
        assert!(matches!(
            login_employee(&state, "", Utc::now()).await,
            Err(AppError::Validation(_))
        ));
    }
}

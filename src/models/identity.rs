use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// The authenticated caller, threaded explicitly through every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Identity {
    Admin { username: String },
    Employee { code: String, name: String },
}

impl Identity {
    /// Returns the admin username, or fails for any other role.
    pub fn require_admin(&self) -> Result<&str> {
        match self {
            Identity::Admin { username } => Ok(username),
            Identity::Employee { .. } => Err(AppError::Unauthorized(
                "Admin role required".to_string(),
            )),
        }
    }

    /// Returns the employee code, or fails for any other role.
    pub fn require_employee(&self) -> Result<&str> {
        match self {
            Identity::Employee { code, .. } => Ok(code),
            Identity::Admin { .. } => Err(AppError::Unauthorized(
                "Employee role required".to_string(),
            )),
        }
    }

    /// Admins may read any employee's data; employees only their own.
    pub fn ensure_can_access(&self, employee_code: &str) -> Result<()> {
        match self {
            Identity::Admin { .. } => Ok(()),
            Identity::Employee { code, .. } if code == employee_code => Ok(()),
            Identity::Employee { code, .. } => {
                tracing::warn!("🚫 Employee {} tried to access data of {}", code, employee_code);
                Err(AppError::Unauthorized(
                    "Employees may only access their own records".to_string(),
                ))
            }
        }
    }
}

//! In-memory implementation of every store contract, used by the unit tests.
//!
//! Each method takes the lock once, so its effect is atomic just like the
//! single-statement (or single-transaction) PostgreSQL counterparts.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{admin::Admin, employee::Employee, routine::RoutineTask, work_log::WorkLog},
    validation::dates::DateRange,
};

use super::{
    admin::AdminStore, employee::EmployeeStore, routine::RoutineStore, work_log::WorkLogStore,
};

#[derive(Default)]
struct Tables {
    admins: Vec<Admin>,
    employees: Vec<Employee>,
    work_logs: Vec<WorkLog>,
    routines: Vec<RoutineTask>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| AppError::Internal("memory store poisoned".to_string()))?;
        Ok(f(&mut tables))
    }

    /// Every stored work log, in insertion order.
    pub fn work_logs(&self) -> Vec<WorkLog> {
        self.with(|t| t.work_logs.clone()).unwrap_or_default()
    }

    /// Stores a session verbatim, bypassing the clock-in rules.
    pub fn seed_work_log(&self, log: WorkLog) {
        let _ = self.with(|t| t.work_logs.push(log));
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn create(&self, code: &str, name: &str, hourly_rate: f64) -> Result<Option<Employee>> {
        self.with(|t| {
            if t.employees.iter().any(|e| e.code == code) {
                return None;
            }
            let employee = Employee {
                code: code.to_string(),
                name: name.to_string(),
                hourly_rate,
                created_at: Utc::now(),
            };
            t.employees.push(employee.clone());
            Some(employee)
        })
    }

    async fn list(&self) -> Result<Vec<Employee>> {
        self.with(|t| {
            let mut employees = t.employees.clone();
            employees.reverse();
            employees.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            employees
        })
    }

    async fn find(&self, code: &str) -> Result<Option<Employee>> {
        self.with(|t| t.employees.iter().find(|e| e.code == code).cloned())
    }

    async fn update(&self, code: &str, name: &str, hourly_rate: f64) -> Result<Option<Employee>> {
        self.with(|t| {
            t.employees.iter_mut().find(|e| e.code == code).map(|e| {
                e.name = name.to_string();
                e.hourly_rate = hourly_rate;
                e.clone()
            })
        })
    }

    async fn delete(&self, code: &str) -> Result<bool> {
        self.with(|t| {
            let before = t.employees.len();
            t.employees.retain(|e| e.code != code);
            let removed = t.employees.len() != before;
            if removed {
                t.work_logs.retain(|l| l.employee_code != code);
                t.routines.retain(|r| r.employee_code != code);
            }
            removed
        })
    }
}

#[async_trait]
impl WorkLogStore for MemoryStore {
    async fn insert_open(
        &self,
        employee_code: &str,
        date: NaiveDate,
        start_time: DateTime<Utc>,
    ) -> Result<Option<WorkLog>> {
        self.with(|t| {
            let clash = t
                .work_logs
                .iter()
                .any(|l| l.employee_code == employee_code && l.date == date && l.is_open());
            if clash {
                return None;
            }
            let log = WorkLog {
                id: Uuid::new_v4(),
                employee_code: employee_code.to_string(),
                date,
                start_time,
                end_time: None,
                total_hours: None,
            };
            t.work_logs.push(log.clone());
            Some(log)
        })
    }

    async fn find_open(&self, employee_code: &str, date: NaiveDate) -> Result<Option<WorkLog>> {
        self.with(|t| {
            t.work_logs
                .iter()
                .filter(|l| l.employee_code == employee_code && l.date == date && l.is_open())
                .max_by_key(|l| l.start_time)
                .cloned()
        })
    }

    async fn close(
        &self,
        id: Uuid,
        end_time: DateTime<Utc>,
        total_hours: f64,
    ) -> Result<Option<WorkLog>> {
        self.with(|t| {
            t.work_logs
                .iter_mut()
                .find(|l| l.id == id && l.is_open())
                .map(|l| {
                    l.end_time = Some(end_time);
                    l.total_hours = Some(total_hours);
                    l.clone()
                })
        })
    }

    async fn list(&self, employee_code: &str, range: Option<DateRange>) -> Result<Vec<WorkLog>> {
        self.with(|t| {
            let mut logs: Vec<WorkLog> = t
                .work_logs
                .iter()
                .filter(|l| l.employee_code == employee_code)
                .filter(|l| range.is_none_or(|r| r.start() <= l.date && l.date <= r.end()))
                .cloned()
                .collect();
            logs.sort_by(|a, b| b.date.cmp(&a.date).then(b.start_time.cmp(&a.start_time)));
            logs
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkLog>> {
        self.with(|t| t.work_logs.iter().find(|l| l.id == id).cloned())
    }

    async fn update_times(
        &self,
        id: Uuid,
        date: NaiveDate,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        total_hours: Option<f64>,
    ) -> Result<Option<WorkLog>> {
        self.with(|t| {
            let Some(target) = t.work_logs.iter().find(|l| l.id == id).cloned() else {
                return Ok(None);
            };
            let reopens_next_to_open = end_time.is_none()
                && t.work_logs.iter().any(|l| {
                    l.id != id
                        && l.employee_code == target.employee_code
                        && l.date == date
                        && l.is_open()
                });
            if reopens_next_to_open {
                return Err(AppError::DuplicateClockIn);
            }
            let log = t
                .work_logs
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or(AppError::NotFound("Work session"))?;
            log.date = date;
            log.start_time = start_time;
            log.end_time = end_time;
            log.total_hours = total_hours;
            Ok(Some(log.clone()))
        })?
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.with(|t| {
            let before = t.work_logs.len();
            t.work_logs.retain(|l| l.id != id);
            t.work_logs.len() != before
        })
    }
}

#[async_trait]
impl RoutineStore for MemoryStore {
    async fn replace(
        &self,
        employee_code: &str,
        date: NaiveDate,
        tasks: &[String],
    ) -> Result<Vec<RoutineTask>> {
        self.with(|t| {
            t.routines
                .retain(|r| !(r.employee_code == employee_code && r.date == date));
            let created: Vec<RoutineTask> = tasks
                .iter()
                .enumerate()
                .map(|(position, task)| RoutineTask {
                    id: Uuid::new_v4(),
                    employee_code: employee_code.to_string(),
                    date,
                    position: position as i32,
                    task: task.clone(),
                    is_completed: false,
                    completed_at: None,
                })
                .collect();
            t.routines.extend(created.iter().cloned());
            created
        })
    }

    async fn list(&self, employee_code: &str, date: NaiveDate) -> Result<Vec<RoutineTask>> {
        self.with(|t| {
            let mut tasks: Vec<RoutineTask> = t
                .routines
                .iter()
                .filter(|r| r.employee_code == employee_code && r.date == date)
                .cloned()
                .collect();
            tasks.sort_by_key(|r| r.position);
            tasks
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RoutineTask>> {
        self.with(|t| t.routines.iter().find(|r| r.id == id).cloned())
    }

    async fn set_completion(
        &self,
        id: Uuid,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<RoutineTask>> {
        self.with(|t| {
            t.routines.iter_mut().find(|r| r.id == id).map(|r| {
                r.is_completed = is_completed;
                r.completed_at = completed_at;
                r.clone()
            })
        })
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Admin>> {
        self.with(|t| t.admins.iter().find(|a| a.username == username).cloned())
    }

    async fn upsert(&self, username: &str, password_hash: &str) -> Result<Admin> {
        self.with(|t| {
            if let Some(admin) = t.admins.iter_mut().find(|a| a.username == username) {
                admin.password_hash = password_hash.to_string();
                return admin.clone();
            }
            let admin = Admin {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            };
            t.admins.push(admin.clone());
            admin
        })
    }
}

//! HR task record.
//!
//! # Invariants
//! - `created_by` must be an `hr` user of the task's company.
//! - `assigned_to` may hold any role but must belong to the same company.
//! - `updated_at` is refreshed on every persisted mutation.

use crate::model::choice::{TaskCategory, TaskPriority, TaskStatus};
use crate::model::company::CompanyId;
use crate::model::user::UserId;
use crate::model::validation::{require_text, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

pub const TASK_TITLE_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub company_id: CompanyId,
    pub assigned_to: UserId,
    pub created_by: UserId,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create input for `Task`. Status and priority start at their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub company_id: CompanyId,
    pub assigned_to: UserId,
    pub created_by: UserId,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: TaskCategory,
}

impl NewTask {
    pub fn new(
        company_id: CompanyId,
        assigned_to: UserId,
        created_by: UserId,
        title: impl Into<String>,
        due_date: NaiveDate,
        category: TaskCategory,
    ) -> Self {
        Self {
            company_id,
            assigned_to,
            created_by,
            title: title.into(),
            description: String::new(),
            due_date,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            category,
        }
    }

    pub fn build(self, now: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            company_id: self.company_id,
            assigned_to: self.assigned_to,
            created_by: self.created_by,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            status: self.status,
            priority: self.priority,
            category: self.category,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for `Task`. The owning company cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub assigned_to: Option<UserId>,
    pub created_by: Option<UserId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Task {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, TASK_TITLE_MAX_CHARS)?;
        Ok(())
    }

    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(assigned_to) = patch.assigned_to {
            self.assigned_to = assigned_to;
        }
        if let Some(created_by) = patch.created_by {
            self.created_by = created_by;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }
}

//! Onboarding checklist attached one-to-one to a task.

use crate::model::payload::OnboardingStep;
use crate::model::task::TaskId;
use crate::model::user::UserId;
use crate::model::validation::{require_text, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OnboardingId = Uuid;

pub const ONBOARDING_STEP_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Onboarding {
    pub id: OnboardingId,
    /// At most one onboarding per task.
    pub task_id: TaskId,
    /// Must be an `employee` of the task's company.
    pub employee_id: UserId,
    pub steps: Vec<OnboardingStep>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOnboarding {
    pub task_id: TaskId,
    pub employee_id: UserId,
    pub steps: Vec<OnboardingStep>,
}

impl NewOnboarding {
    pub fn new(task_id: TaskId, employee_id: UserId, steps: Vec<OnboardingStep>) -> Self {
        Self {
            task_id,
            employee_id,
            steps,
        }
    }

    pub fn build(self) -> Onboarding {
        Onboarding {
            id: Uuid::new_v4(),
            task_id: self.task_id,
            employee_id: self.employee_id,
            steps: self.steps,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingPatch {
    pub employee_id: Option<UserId>,
    pub steps: Option<Vec<OnboardingStep>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl Onboarding {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.steps.is_empty() {
            return Err(ValidationError::NoOnboardingSteps);
        }
        for step in &self.steps {
            require_text("steps.step", &step.step, ONBOARDING_STEP_MAX_CHARS)?;
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: OnboardingPatch) {
        if let Some(employee_id) = patch.employee_id {
            self.employee_id = employee_id;
        }
        if let Some(steps) = patch.steps {
            self.steps = steps;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
    }

    /// Marks step `index` and keeps `completed_at` in sync with the
    /// checklist. Returns `false` when `index` is out of range.
    pub fn set_step(&mut self, index: usize, completed: bool, now: DateTime<Utc>) -> bool {
        let Some(step) = self.steps.get_mut(index) else {
            return false;
        };
        step.completed = completed;
        self.completed_at = if self.all_steps_completed() {
            Some(self.completed_at.unwrap_or(now))
        } else {
            None
        };
        true
    }

    pub fn all_steps_completed(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|step| step.completed)
    }

    /// Returns `(completed, total)` step counts.
    pub fn progress(&self) -> (usize, usize) {
        let done = self.steps.iter().filter(|step| step.completed).count();
        (done, self.steps.len())
    }
}

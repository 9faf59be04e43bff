//! Task and onboarding use-case service.
//!
//! # Responsibility
//! - Create tasks and move them between statuses.
//! - Start onboarding (task + checklist) and track step completion.
//!
//! # Invariants
//! - Status transitions are unrestricted; `pending -> completed` is legal.
//! - `completed_at` is set exactly when every step is completed.

use crate::model::choice::TaskStatus;
use crate::model::onboarding::{Onboarding, OnboardingId};
use crate::model::payload::OnboardingStep;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::model::user::UserId;
use crate::repo::onboarding_repo::{OnboardingRepository, StepUpdate};
use crate::repo::task_repo::{TaskListQuery, TaskRepository};
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Use-case service for tasks and onboarding checklists.
pub struct TaskService<T: TaskRepository, O: OnboardingRepository> {
    tasks: T,
    onboardings: O,
}

impl<T: TaskRepository, O: OnboardingRepository> TaskService<T, O> {
    pub fn new(tasks: T, onboardings: O) -> Self {
        Self { tasks, onboardings }
    }

    pub fn create_task(&self, new: NewTask) -> ServiceResult<Task> {
        let task = self.tasks.create_task(new)?;
        info!(
            "event=task_create module=service status=ok task_id={} company_id={}",
            task.id, task.company_id
        );
        Ok(task)
    }

    /// Sets the task status. Any transition is accepted.
    pub fn set_status(&self, id: TaskId, status: TaskStatus) -> ServiceResult<Task> {
        let task = self.tasks.update_task(id, TaskPatch::status(status))?;
        info!(
            "event=task_status module=service status=ok task_id={id} task_status={}",
            status.as_str()
        );
        Ok(task)
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> ServiceResult<Vec<Task>> {
        Ok(self.tasks.list_tasks(query)?)
    }

    /// Creates an onboarding task for `employee_id` with open steps.
    ///
    /// The task category is forced to `onboarding`; task and checklist are
    /// written in one transaction.
    pub fn start_onboarding<S>(
        &self,
        new: NewTask,
        employee_id: UserId,
        steps: impl IntoIterator<Item = S>,
    ) -> ServiceResult<(Task, Onboarding)>
    where
        S: Into<String>,
    {
        let steps = steps.into_iter().map(OnboardingStep::open).collect();
        let (task, onboarding) = self
            .tasks
            .create_onboarding_task(new, employee_id, steps)?;
        info!(
            "event=onboarding_start module=service status=ok task_id={} onboarding_id={}",
            task.id, onboarding.id
        );
        Ok((task, onboarding))
    }

    pub fn complete_step(&self, id: OnboardingId, index: usize) -> ServiceResult<Onboarding> {
        self.set_step_completed(id, index, true)
    }

    pub fn reopen_step(&self, id: OnboardingId, index: usize) -> ServiceResult<Onboarding> {
        self.set_step_completed(id, index, false)
    }

    /// Marks one step; `completed_at` follows the checklist.
    pub fn set_step_completed(
        &self,
        id: OnboardingId,
        index: usize,
        completed: bool,
    ) -> ServiceResult<Onboarding> {
        let onboarding = match self.onboardings.set_onboarding_step(id, index, completed)? {
            StepUpdate::Updated(onboarding) => onboarding,
            StepUpdate::OutOfRange { len } => {
                return Err(ServiceError::StepOutOfRange { index, len });
            }
        };

        let (done, total) = onboarding.progress();
        info!(
            "event=onboarding_step module=service status=ok onboarding_id={id} done={done} total={total}"
        );
        Ok(onboarding)
    }
}

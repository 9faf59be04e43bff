//! Leave (time-off) request record.
//!
//! # Invariants
//! - `end_date >= start_date`.
//! - `employee` holds the `employee` role; `approved_by`, when set, holds
//!   `hr` in the same company.

use crate::model::choice::{LeaveStatus, LeaveType};
use crate::model::user::UserId;
use crate::model::validation::{validate_date_range, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LeaveRequestId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub employee_id: UserId,
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub approved_by: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeaveRequest {
    pub employee_id: UserId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewLeaveRequest {
    pub fn new(
        employee_id: UserId,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            employee_id,
            leave_type,
            start_date,
            end_date,
        }
    }

    pub fn build(self) -> LeaveRequest {
        LeaveRequest {
            id: Uuid::new_v4(),
            employee_id: self.employee_id,
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            status: LeaveStatus::default(),
            approved_by: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveRequestPatch {
    pub leave_type: Option<LeaveType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<LeaveStatus>,
    pub approved_by: Option<Option<UserId>>,
}

impl LeaveRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_date_range("start_date", self.start_date, "end_date", self.end_date)
    }

    pub fn apply(&mut self, patch: LeaveRequestPatch) {
        if let Some(leave_type) = patch.leave_type {
            self.leave_type = leave_type;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(approved_by) = patch.approved_by {
            self.approved_by = approved_by;
        }
    }

    /// Inclusive number of calendar days covered.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

//! Leave request use-case service.

use crate::model::choice::LeaveStatus;
use crate::model::leave::{LeaveRequest, LeaveRequestId, NewLeaveRequest};
use crate::model::user::UserId;
use crate::repo::leave_repo::{LeaveDecision, LeaveListQuery, LeaveRepository};
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Submits leave requests and records hr decisions on them.
pub struct LeaveService<R: LeaveRepository> {
    repo: R,
}

impl<R: LeaveRepository> LeaveService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn submit(&self, new: NewLeaveRequest) -> ServiceResult<LeaveRequest> {
        let request = self.repo.create_leave_request(new)?;
        info!(
            "event=leave_submit module=service status=ok leave_id={} employee_id={}",
            request.id, request.employee_id
        );
        Ok(request)
    }

    pub fn approve(&self, id: LeaveRequestId, approver: UserId) -> ServiceResult<LeaveRequest> {
        self.decide(id, approver, LeaveStatus::Approved)
    }

    pub fn reject(&self, id: LeaveRequestId, approver: UserId) -> ServiceResult<LeaveRequest> {
        self.decide(id, approver, LeaveStatus::Rejected)
    }

    pub fn list(&self, query: &LeaveListQuery) -> ServiceResult<Vec<LeaveRequest>> {
        Ok(self.repo.list_leave_requests(query)?)
    }

    /// Only `pending` requests can be decided; the approver must be `hr` in
    /// the employee's company (checked by the repository).
    fn decide(
        &self,
        id: LeaveRequestId,
        approver: UserId,
        status: LeaveStatus,
    ) -> ServiceResult<LeaveRequest> {
        let request = match self.repo.decide_leave_request(id, status, approver)? {
            LeaveDecision::Decided(request) => request,
            LeaveDecision::AlreadyDecided(current) => {
                return Err(ServiceError::LeaveAlreadyDecided {
                    id,
                    status: current,
                });
            }
        };
        info!(
            "event=leave_decide module=service status=ok leave_id={id} decision={}",
            status.as_str()
        );
        Ok(request)
    }
}

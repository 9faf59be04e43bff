//! Payroll use-case service.

use crate::model::payroll::{NewPayroll, Payroll, PayrollId, PayrollPatch};
use crate::model::user::UserId;
use crate::repo::payroll_repo::{PayrollListQuery, PayrollRepository};
use crate::service::ServiceResult;
use log::info;

pub struct PayrollService<R: PayrollRepository> {
    repo: R,
}

impl<R: PayrollRepository> PayrollService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records one pay period. A missing net amount is derived as
    /// `gross - deductions + bonuses`; a supplied one must match it.
    pub fn record(&self, new: NewPayroll) -> ServiceResult<Payroll> {
        let payroll = self.repo.create_payroll(new)?;
        info!(
            "event=payroll_record module=service status=ok payroll_id={} employee_id={}",
            payroll.id, payroll.employee_id
        );
        Ok(payroll)
    }

    /// Applies a correction; the net amount follows changed inputs.
    pub fn adjust(&self, id: PayrollId, patch: PayrollPatch) -> ServiceResult<Payroll> {
        let payroll = self.repo.update_payroll(id, patch)?;
        info!("event=payroll_adjust module=service status=ok payroll_id={id}");
        Ok(payroll)
    }

    pub fn history(&self, employee_id: UserId) -> ServiceResult<Vec<Payroll>> {
        Ok(self.repo.list_payrolls(&PayrollListQuery {
            employee_id: Some(employee_id),
            ..PayrollListQuery::default()
        })?)
    }
}

mod common;

use hrdesk_core::db::open_db_in_memory;
use hrdesk_core::repo::leave_repo::{
    LeaveDecision, LeaveListQuery, LeaveRepository, SqliteLeaveRepository,
};
use hrdesk_core::repo::payroll_repo::{
    PayrollListQuery, PayrollRepository, SqlitePayrollRepository,
};
use hrdesk_core::service::leave_service::LeaveService;
use hrdesk_core::service::payroll_service::PayrollService;
use hrdesk_core::{
    IntegrityReason, LeaveRequest, LeaveRequestId, LeaveRequestPatch, LeaveStatus, LeaveType,
    NewLeaveRequest, NewPayroll, PayrollPatch, RepoError, RepoResult, Role, ServiceError, UserId,
    ValidationError,
};
use rust_decimal::Decimal;
use std::str::FromStr;

fn money(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

/// Lets another hr user decide the request right before every decision.
struct RivalDecidesFirst<'conn> {
    inner: SqliteLeaveRepository<'conn>,
    rival: UserId,
}

impl LeaveRepository for RivalDecidesFirst<'_> {
    fn create_leave_request(&self, new: NewLeaveRequest) -> RepoResult<LeaveRequest> {
        self.inner.create_leave_request(new)
    }

    fn get_leave_request(&self, id: LeaveRequestId) -> RepoResult<Option<LeaveRequest>> {
        self.inner.get_leave_request(id)
    }

    fn list_leave_requests(&self, query: &LeaveListQuery) -> RepoResult<Vec<LeaveRequest>> {
        self.inner.list_leave_requests(query)
    }

    fn update_leave_request(
        &self,
        id: LeaveRequestId,
        patch: LeaveRequestPatch,
    ) -> RepoResult<LeaveRequest> {
        self.inner.update_leave_request(id, patch)
    }

    fn decide_leave_request(
        &self,
        id: LeaveRequestId,
        status: LeaveStatus,
        approver: UserId,
    ) -> RepoResult<LeaveDecision> {
        self.inner
            .decide_leave_request(id, LeaveStatus::Rejected, self.rival)?;
        self.inner.decide_leave_request(id, status, approver)
    }

    fn delete_leave_request(&self, id: LeaveRequestId) -> RepoResult<()> {
        self.inner.delete_leave_request(id)
    }
}

#[test]
fn submitted_leave_starts_pending_without_approver() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let bob = common::employee(&conn, &acme, "bob");
    let service = LeaveService::new(SqliteLeaveRepository::try_new(&conn).unwrap());

    let request = service
        .submit(NewLeaveRequest::new(
            bob.id,
            LeaveType::Vacation,
            common::date(2024, 7, 1),
            common::date(2024, 7, 5),
        ))
        .unwrap();

    assert_eq!(request.status, LeaveStatus::Pending);
    assert_eq!(request.approved_by, None);
    assert_eq!(request.day_count(), 5);
}

#[test]
fn reversed_leave_dates_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let bob = common::employee(&conn, &acme, "bob");
    let repo = SqliteLeaveRepository::try_new(&conn).unwrap();

    let err = repo
        .create_leave_request(NewLeaveRequest::new(
            bob.id,
            LeaveType::Sick,
            common::date(2024, 7, 5),
            common::date(2024, 7, 1),
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::ReversedDateRange { .. })
    ));
}

#[test]
fn only_employees_request_leave() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let repo = SqliteLeaveRepository::try_new(&conn).unwrap();

    let err = repo
        .create_leave_request(NewLeaveRequest::new(
            alice.id,
            LeaveType::Other,
            common::date(2024, 7, 1),
            common::date(2024, 7, 1),
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::ReferentialIntegrity {
            field: "employee_id",
            reason: IntegrityReason::RoleMismatch {
                expected: Role::Employee,
                actual: Role::Hr,
            },
        }
    ));
}

#[test]
fn hr_approves_pending_leave_once() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let service = LeaveService::new(SqliteLeaveRepository::try_new(&conn).unwrap());
    let request = service
        .submit(NewLeaveRequest::new(
            bob.id,
            LeaveType::Vacation,
            common::date(2024, 7, 1),
            common::date(2024, 7, 5),
        ))
        .unwrap();

    let approved = service.approve(request.id, alice.id).unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.approved_by, Some(alice.id));

    let err = service.reject(request.id, alice.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::LeaveAlreadyDecided {
            status: LeaveStatus::Approved,
            ..
        }
    ));
}

#[test]
fn approver_must_be_hr_of_the_same_company() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let globex = common::company(&conn, "Globex");
    let bob = common::employee(&conn, &acme, "bob");
    let carol = common::employee(&conn, &acme, "carol");
    let gina = common::hr(&conn, &globex, "gina");
    let service = LeaveService::new(SqliteLeaveRepository::try_new(&conn).unwrap());
    let request = service
        .submit(NewLeaveRequest::new(
            bob.id,
            LeaveType::Vacation,
            common::date(2024, 7, 1),
            common::date(2024, 7, 5),
        ))
        .unwrap();

    let by_employee = service.approve(request.id, carol.id).unwrap_err();
    assert!(matches!(
        by_employee,
        ServiceError::Repo(RepoError::ReferentialIntegrity {
            field: "approved_by",
            reason: IntegrityReason::RoleMismatch { .. },
        })
    ));

    let by_outsider = service.approve(request.id, gina.id).unwrap_err();
    assert!(matches!(
        by_outsider,
        ServiceError::Repo(RepoError::ReferentialIntegrity {
            field: "approved_by",
            reason: IntegrityReason::CrossTenant { .. },
        })
    ));

    let unchanged = SqliteLeaveRepository::try_new(&conn)
        .unwrap()
        .get_leave_request(request.id)
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, LeaveStatus::Pending);
}

#[test]
fn leave_list_filters_through_employee_company() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let globex = common::company(&conn, "Globex");
    let bob = common::employee(&conn, &acme, "bob");
    let dave = common::employee(&conn, &globex, "dave");
    let repo = SqliteLeaveRepository::try_new(&conn).unwrap();
    for employee in [bob.id, dave.id] {
        repo.create_leave_request(NewLeaveRequest::new(
            employee,
            LeaveType::Sick,
            common::date(2024, 2, 1),
            common::date(2024, 2, 2),
        ))
        .unwrap();
    }

    let acme_requests = repo
        .list_leave_requests(&LeaveListQuery {
            company_id: Some(acme.id),
            status: Some(LeaveStatus::Pending),
            ..LeaveListQuery::default()
        })
        .unwrap();
    assert_eq!(acme_requests.len(), 1);
    assert_eq!(acme_requests[0].employee_id, bob.id);
}

#[test]
fn payroll_net_salary_is_derived_when_omitted() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let bob = common::employee(&conn, &acme, "bob");
    let service = PayrollService::new(SqlitePayrollRepository::try_new(&conn).unwrap());

    let mut new = NewPayroll::new(
        bob.id,
        "2023-10",
        money("5000.00"),
        money("750.50"),
        common::doc("payslips/bob-2023-10.pdf"),
    );
    new.bonuses = money("250.25");
    let payroll = service.record(new).unwrap();

    assert_eq!(payroll.net_salary, money("4499.75"));

    let stored = SqlitePayrollRepository::try_new(&conn)
        .unwrap()
        .get_payroll(payroll.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored, payroll);
}

#[test]
fn payroll_rejects_mismatched_net_and_excess_precision() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let bob = common::employee(&conn, &acme, "bob");
    let repo = SqlitePayrollRepository::try_new(&conn).unwrap();

    let mut mismatched = NewPayroll::new(
        bob.id,
        "2023-10",
        money("5000.00"),
        money("1000.00"),
        common::doc("payslips/a.pdf"),
    );
    mismatched.net_salary = Some(money("4500.00"));
    let err = repo.create_payroll(mismatched).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::NetSalaryMismatch { .. })
    ));

    let precise = NewPayroll::new(
        bob.id,
        "2023-10",
        money("5000.001"),
        money("0"),
        common::doc("payslips/b.pdf"),
    );
    let err = repo.create_payroll(precise).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MoneyPrecision {
            field: "gross_salary",
            ..
        })
    ));

    let too_large = NewPayroll::new(
        bob.id,
        "2023-10",
        money("100000000.00"),
        money("0"),
        common::doc("payslips/c.pdf"),
    );
    assert!(repo.create_payroll(too_large).is_err());
}

#[test]
fn payroll_requires_employee_role() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let repo = SqlitePayrollRepository::try_new(&conn).unwrap();

    let err = repo
        .create_payroll(NewPayroll::new(
            alice.id,
            "2023-10",
            money("5000.00"),
            money("0"),
            common::doc("payslips/alice.pdf"),
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::ReferentialIntegrity {
            field: "employee_id",
            reason: IntegrityReason::RoleMismatch { .. },
        }
    ));
}

#[test]
fn payroll_adjustment_recomputes_net_and_history_is_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let bob = common::employee(&conn, &acme, "bob");
    let service = PayrollService::new(SqlitePayrollRepository::try_new(&conn).unwrap());

    let october = service
        .record(NewPayroll::new(
            bob.id,
            "2023-10",
            money("5000.00"),
            money("500.00"),
            common::doc("payslips/10.pdf"),
        ))
        .unwrap();
    service
        .record(NewPayroll::new(
            bob.id,
            "2023-11",
            money("5000.00"),
            money("500.00"),
            common::doc("payslips/11.pdf"),
        ))
        .unwrap();

    let adjusted = service
        .adjust(
            october.id,
            PayrollPatch {
                bonuses: Some(money("100.00")),
                ..PayrollPatch::default()
            },
        )
        .unwrap();
    assert_eq!(adjusted.net_salary, money("4600.00"));

    let periods: Vec<_> = service
        .history(bob.id)
        .unwrap()
        .into_iter()
        .map(|p| p.period)
        .collect();
    assert_eq!(periods, ["2023-11", "2023-10"]);

    let filtered = SqlitePayrollRepository::try_new(&conn)
        .unwrap()
        .list_payrolls(&PayrollListQuery {
            period: Some("2023-10".to_string()),
            ..PayrollListQuery::default()
        })
        .unwrap();
    assert_eq!(filtered.len(), 1);
}

#[test]
fn earlier_decision_by_another_hr_user_is_kept() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let hank = common::hr(&conn, &acme, "hank");
    let bob = common::employee(&conn, &acme, "bob");
    let service = LeaveService::new(RivalDecidesFirst {
        inner: SqliteLeaveRepository::try_new(&conn).unwrap(),
        rival: hank.id,
    });
    let request = service
        .submit(NewLeaveRequest::new(
            bob.id,
            LeaveType::Vacation,
            common::date(2024, 7, 1),
            common::date(2024, 7, 5),
        ))
        .unwrap();

    let err = service.approve(request.id, alice.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::LeaveAlreadyDecided {
            status: LeaveStatus::Rejected,
            ..
        }
    ));

    let stored = SqliteLeaveRepository::try_new(&conn)
        .unwrap()
        .get_leave_request(request.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, LeaveStatus::Rejected);
    assert_eq!(stored.approved_by, Some(hank.id));
}

#[test]
fn leave_update_rechecks_approver() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let globex = common::company(&conn, "Globex");
    let bob = common::employee(&conn, &acme, "bob");
    let carol = common::employee(&conn, &acme, "carol");
    let gina = common::hr(&conn, &globex, "gina");
    let repo = SqliteLeaveRepository::try_new(&conn).unwrap();
    let request = repo
        .create_leave_request(NewLeaveRequest::new(
            bob.id,
            LeaveType::Vacation,
            common::date(2024, 7, 1),
            common::date(2024, 7, 5),
        ))
        .unwrap();

    let by_employee = repo
        .update_leave_request(
            request.id,
            LeaveRequestPatch {
                approved_by: Some(Some(carol.id)),
                ..LeaveRequestPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        by_employee,
        RepoError::ReferentialIntegrity {
            field: "approved_by",
            reason: IntegrityReason::RoleMismatch {
                expected: Role::Hr,
                actual: Role::Employee,
            },
        }
    ));

    let by_outsider = repo
        .update_leave_request(
            request.id,
            LeaveRequestPatch {
                approved_by: Some(Some(gina.id)),
                ..LeaveRequestPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        by_outsider,
        RepoError::ReferentialIntegrity {
            field: "approved_by",
            reason: IntegrityReason::CrossTenant { .. },
        }
    ));
}

#[test]
fn extreme_amounts_are_validation_errors() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let bob = common::employee(&conn, &acme, "bob");
    let service = PayrollService::new(SqlitePayrollRepository::try_new(&conn).unwrap());

    let err = SqlitePayrollRepository::try_new(&conn)
        .unwrap()
        .create_payroll(NewPayroll::new(
            bob.id,
            "2024-01",
            Decimal::MAX,
            Decimal::MIN,
            common::doc("payslips/max.pdf"),
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MoneyPrecision {
            field: "gross_salary",
            ..
        })
    ));
    assert_eq!(common::count_rows(&conn, "payrolls"), 0);

    let payroll = service
        .record(NewPayroll::new(
            bob.id,
            "2024-01",
            money("5000.00"),
            money("500.00"),
            common::doc("payslips/01.pdf"),
        ))
        .unwrap();
    let err = service
        .adjust(
            payroll.id,
            PayrollPatch {
                bonuses: Some(Decimal::MAX),
                ..PayrollPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::Validation(ValidationError::MoneyPrecision {
            field: "bonuses",
            ..
        }))
    ));
}

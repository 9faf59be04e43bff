mod common;

use hrdesk_core::db::open_db_in_memory;
use hrdesk_core::repo::payroll_repo::{PayrollRepository, SqlitePayrollRepository};
use hrdesk_core::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use hrdesk_core::repo::user_repo::{SqliteUserRepository, UserListQuery, UserRepository};
use hrdesk_core::{
    IntegrityReason, NewPayroll, NewTask, NewUser, RepoError, Role, TaskCategory, UserPatch,
    ValidationError,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[test]
fn create_and_get_user_with_defaults() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let mut new = NewUser::new(acme.id, "alice", Role::Hr);
    new.email = Some("alice@acme.com".to_string());
    new.date_joined_company = Some(common::date(2023, 1, 9));
    let alice = repo.create_user(new).unwrap();

    let loaded = repo.get_user(alice.id).unwrap().unwrap();
    assert_eq!(loaded, alice);
    assert!(loaded.is_active);
    assert!(!loaded.is_verified);
    assert_eq!(loaded.invited_by, None);
    assert_eq!(loaded.date_joined_company, Some(common::date(2023, 1, 9)));
    assert_eq!(
        repo.find_user_by_username("alice").unwrap().map(|u| u.id),
        Some(alice.id)
    );
}

#[test]
fn username_is_unique_across_companies() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let globex = common::company(&conn, "Globex");
    common::hr(&conn, &acme, "alice");

    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let err = repo
        .create_user(NewUser::new(globex.id, "alice", Role::Employee))
        .unwrap_err();
    assert!(err.is_constraint_violation(), "{err}");
}

#[test]
fn malformed_email_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let mut new = NewUser::new(acme.id, "bob", Role::Employee);
    new.email = Some("bob-at-acme".to_string());
    let err = repo.create_user(new).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidEmail { field: "email" })
    ));
}

#[test]
fn user_in_missing_company_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let err = repo
        .create_user(NewUser::new(Uuid::new_v4(), "ghost", Role::Hr))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::ReferentialIntegrity {
            field: "company_id",
            reason: IntegrityReason::MissingTarget(_),
        }
    ));
}

#[test]
fn list_filters_by_company_and_role() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let globex = common::company(&conn, "Globex");
    common::hr(&conn, &acme, "alice");
    common::employee(&conn, &acme, "bob");
    common::employee(&conn, &acme, "carol");
    common::employee(&conn, &globex, "dave");

    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let acme_employees = repo
        .list_users(&UserListQuery {
            company_id: Some(acme.id),
            role: Some(Role::Employee),
            ..UserListQuery::default()
        })
        .unwrap();
    let names: Vec<_> = acme_employees.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["bob", "carol"]);
}

#[test]
fn role_change_is_refused_while_role_scoped_links_exist() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");

    SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .create_task(NewTask::new(
            acme.id,
            bob.id,
            alice.id,
            "Quarterly review",
            common::date(2024, 3, 31),
            TaskCategory::Evaluation,
        ))
        .unwrap();
    SqlitePayrollRepository::try_new(&conn)
        .unwrap()
        .create_payroll(NewPayroll::new(
            bob.id,
            "2024-01",
            Decimal::new(300_000, 2),
            Decimal::new(50_000, 2),
            common::doc("payslips/bob-2024-01.pdf"),
        ))
        .unwrap();

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let demote = users
        .update_user(
            alice.id,
            UserPatch {
                role: Some(Role::Employee),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        demote,
        RepoError::ReferentialIntegrity {
            field: "role",
            reason: IntegrityReason::RoleStillReferenced {
                role: Role::Hr,
                referenced_by: "tasks.created_by",
            },
        }
    ));

    let promote = users
        .update_user(
            bob.id,
            UserPatch {
                role: Some(Role::Hr),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        promote,
        RepoError::ReferentialIntegrity {
            field: "role",
            reason: IntegrityReason::RoleStillReferenced {
                role: Role::Employee,
                referenced_by: "payrolls.employee_id",
            },
        }
    ));
}

#[test]
fn role_change_without_links_succeeds() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let bob = common::employee(&conn, &acme, "bob");

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let promoted = users
        .update_user(
            bob.id,
            UserPatch {
                role: Some(Role::Hr),
                ..UserPatch::default()
            },
        )
        .unwrap();
    assert_eq!(promoted.role, Role::Hr);
}

#[test]
fn user_cannot_invite_itself() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let bob = common::employee(&conn, &acme, "bob");

    let err = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .update_user(
            bob.id,
            UserPatch {
                invited_by: Some(Some(bob.id)),
                ..UserPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::SelfReference { field: "invited_by" })
    ));
}

#[test]
fn company_of_a_user_cannot_be_rewritten_in_storage() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let globex = common::company(&conn, "Globex");
    let bob = common::employee(&conn, &acme, "bob");

    let err = conn
        .execute(
            "UPDATE users SET company_id = ?1 WHERE id = ?2;",
            [globex.id.to_string(), bob.id.to_string()],
        )
        .unwrap_err();
    assert!(err.to_string().contains("users.company_id is immutable"));
}

mod common;

use hrdesk_core::db::{open_db, open_db_in_memory};
use hrdesk_core::repo::onboarding_repo::{
    OnboardingListQuery, OnboardingRepository, SqliteOnboardingRepository, StepUpdate,
};
use hrdesk_core::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
use hrdesk_core::service::task_service::TaskService;
use hrdesk_core::{
    IntegrityReason, NewOnboarding, NewTask, OnboardingPatch, OnboardingStep, RepoError, Role,
    ServiceError, TaskCategory, TaskPatch, TaskPriority, TaskStatus, ValidationError,
};
use rusqlite::Connection;
use std::thread::sleep;
use std::time::Duration;

fn task_service(
    conn: &Connection,
) -> TaskService<SqliteTaskRepository<'_>, SqliteOnboardingRepository<'_>> {
    TaskService::new(
        SqliteTaskRepository::try_new(conn).unwrap(),
        SqliteOnboardingRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn create_task_with_defaults() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = repo
        .create_task(NewTask::new(
            acme.id,
            bob.id,
            alice.id,
            "Sign handbook",
            common::date(2024, 2, 1),
            TaskCategory::Other,
        ))
        .unwrap();

    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.priority, TaskPriority::Medium);
    assert_eq!(task.description, "");
    assert_eq!(task.created_at, task.updated_at);
    assert_eq!(repo.get_task(task.id).unwrap(), Some(task));
}

#[test]
fn employee_cannot_be_task_creator() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let bob = common::employee(&conn, &acme, "bob");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let err = repo
        .create_task(NewTask::new(
            acme.id,
            bob.id,
            bob.id,
            "Self-assigned",
            common::date(2024, 2, 1),
            TaskCategory::Other,
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::ReferentialIntegrity {
            field: "created_by",
            reason: IntegrityReason::RoleMismatch {
                expected: Role::Hr,
                actual: Role::Employee,
            },
        }
    ));
    assert_eq!(common::count_rows(&conn, "tasks"), 0);
}

#[test]
fn hr_may_be_assigned_a_task() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = repo
        .create_task(NewTask::new(
            acme.id,
            alice.id,
            alice.id,
            "Plan offsite",
            common::date(2024, 5, 1),
            TaskCategory::Other,
        ))
        .unwrap();
    assert_eq!(task.assigned_to, alice.id);
}

#[test]
fn update_refreshes_updated_at_and_allows_skipping_statuses() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let service = task_service(&conn);

    let task = service
        .create_task(NewTask::new(
            acme.id,
            bob.id,
            alice.id,
            "Quarterly review",
            common::date(2024, 3, 31),
            TaskCategory::Evaluation,
        ))
        .unwrap();

    sleep(Duration::from_millis(5));
    let done = service.set_status(task.id, TaskStatus::Completed).unwrap();

    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.created_at, task.created_at);
    assert!(done.updated_at > task.updated_at);

    let reopened = service.set_status(task.id, TaskStatus::Pending).unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
}

#[test]
fn blank_title_is_rejected_on_update() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let task = repo
        .create_task(NewTask::new(
            acme.id,
            alice.id,
            alice.id,
            "Title",
            common::date(2024, 3, 31),
            TaskCategory::Other,
        ))
        .unwrap();

    let err = repo
        .update_task(
            task.id,
            TaskPatch {
                title: Some(String::new()),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyField { field: "title" })
    ));
}

#[test]
fn list_filters_by_assignee_and_status_ordered_by_due_date() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let carol = common::employee(&conn, &acme, "carol");
    let service = task_service(&conn);

    for (assignee, title, day) in [(bob.id, "late", 20), (bob.id, "early", 10), (carol.id, "other", 1)] {
        service
            .create_task(NewTask::new(
                acme.id,
                assignee,
                alice.id,
                title,
                common::date(2024, 4, day),
                TaskCategory::Other,
            ))
            .unwrap();
    }

    let bobs = service
        .list_tasks(&TaskListQuery {
            assigned_to: Some(bob.id),
            status: Some(TaskStatus::Pending),
            ..TaskListQuery::default()
        })
        .unwrap();
    let titles: Vec<_> = bobs.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["early", "late"]);
}

#[test]
fn start_onboarding_creates_task_and_checklist_together() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let service = task_service(&conn);

    let (task, onboarding) = service
        .start_onboarding(
            NewTask::new(
                acme.id,
                bob.id,
                alice.id,
                "Welcome Bob",
                common::date(2024, 1, 15),
                TaskCategory::Other,
            ),
            bob.id,
            ["Sign contract", "Setup laptop"],
        )
        .unwrap();

    assert_eq!(task.category, TaskCategory::Onboarding);
    assert_eq!(onboarding.task_id, task.id);
    assert_eq!(onboarding.employee_id, bob.id);
    assert_eq!(
        onboarding.steps,
        vec![
            OnboardingStep::open("Sign contract"),
            OnboardingStep::open("Setup laptop")
        ]
    );
    assert!(onboarding.completed_at.is_none());

    let repo = SqliteOnboardingRepository::try_new(&conn).unwrap();
    assert_eq!(
        repo.find_onboarding_by_task(task.id).unwrap(),
        Some(onboarding)
    );
}

#[test]
fn start_onboarding_rolls_back_task_when_checklist_is_invalid() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let service = task_service(&conn);

    // hr cannot be the onboarded employee.
    let err = service
        .start_onboarding(
            NewTask::new(
                acme.id,
                alice.id,
                alice.id,
                "Welcome",
                common::date(2024, 1, 15),
                TaskCategory::Onboarding,
            ),
            alice.id,
            ["Sign contract"],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::ReferentialIntegrity {
            field: "employee_id",
            ..
        })
    ));

    let empty = service
        .start_onboarding(
            NewTask::new(
                acme.id,
                alice.id,
                alice.id,
                "Welcome",
                common::date(2024, 1, 15),
                TaskCategory::Onboarding,
            ),
            alice.id,
            Vec::<String>::new(),
        )
        .unwrap_err();
    assert!(matches!(
        empty,
        ServiceError::Repo(RepoError::Validation(ValidationError::NoOnboardingSteps))
    ));
    assert_eq!(common::count_rows(&conn, "tasks"), 0);
}

#[test]
fn second_onboarding_for_same_task_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let (task, _) = task_service(&conn)
        .start_onboarding(
            NewTask::new(
                acme.id,
                bob.id,
                alice.id,
                "Welcome Bob",
                common::date(2024, 1, 15),
                TaskCategory::Onboarding,
            ),
            bob.id,
            ["Sign contract"],
        )
        .unwrap();

    let err = SqliteOnboardingRepository::try_new(&conn)
        .unwrap()
        .create_onboarding(NewOnboarding::new(
            task.id,
            bob.id,
            vec![OnboardingStep::open("Again")],
        ))
        .unwrap_err();
    assert!(err.is_constraint_violation(), "{err}");
}

#[test]
fn completing_all_steps_sets_completed_at_and_reopening_clears_it() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let service = task_service(&conn);
    let (_, onboarding) = service
        .start_onboarding(
            NewTask::new(
                acme.id,
                bob.id,
                alice.id,
                "Welcome Bob",
                common::date(2024, 1, 15),
                TaskCategory::Onboarding,
            ),
            bob.id,
            ["Sign contract", "Setup laptop"],
        )
        .unwrap();

    let partial = service.complete_step(onboarding.id, 0).unwrap();
    assert_eq!(partial.progress(), (1, 2));
    assert!(partial.completed_at.is_none());

    let done = service.complete_step(onboarding.id, 1).unwrap();
    assert!(done.all_steps_completed());
    let completed_at = done.completed_at.unwrap();

    let still_done = service.complete_step(onboarding.id, 1).unwrap();
    assert_eq!(still_done.completed_at, Some(completed_at));

    let reopened = service.reopen_step(onboarding.id, 0).unwrap();
    assert!(reopened.completed_at.is_none());

    let out_of_range = service.complete_step(onboarding.id, 5).unwrap_err();
    assert!(matches!(
        out_of_range,
        ServiceError::StepOutOfRange { index: 5, len: 2 }
    ));

    let listed = SqliteOnboardingRepository::try_new(&conn)
        .unwrap()
        .list_onboardings(&OnboardingListQuery {
            employee_id: Some(bob.id),
            completed: Some(false),
            ..OnboardingListQuery::default()
        })
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn deleting_task_removes_its_onboarding() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let (task, _) = task_service(&conn)
        .start_onboarding(
            NewTask::new(
                acme.id,
                bob.id,
                alice.id,
                "Welcome Bob",
                common::date(2024, 1, 15),
                TaskCategory::Onboarding,
            ),
            bob.id,
            ["Sign contract"],
        )
        .unwrap();

    SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .delete_task(task.id)
        .unwrap();
    assert_eq!(common::count_rows(&conn, "onboardings"), 0);
}

#[test]
fn task_update_rechecks_creator_role_and_assignee_company() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let globex = common::company(&conn, "Globex");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let dave = common::employee(&conn, &globex, "dave");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let task = repo
        .create_task(NewTask::new(
            acme.id,
            bob.id,
            alice.id,
            "Quarterly review",
            common::date(2024, 3, 31),
            TaskCategory::Evaluation,
        ))
        .unwrap();

    let demoted_creator = repo
        .update_task(
            task.id,
            TaskPatch {
                created_by: Some(bob.id),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        demoted_creator,
        RepoError::ReferentialIntegrity {
            field: "created_by",
            reason: IntegrityReason::RoleMismatch {
                expected: Role::Hr,
                actual: Role::Employee,
            },
        }
    ));

    let outsider = repo
        .update_task(
            task.id,
            TaskPatch {
                assigned_to: Some(dave.id),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        outsider,
        RepoError::ReferentialIntegrity {
            field: "assigned_to",
            reason: IntegrityReason::CrossTenant { .. },
        }
    ));

    assert_eq!(repo.get_task(task.id).unwrap(), Some(task));
}

#[test]
fn onboarding_update_rechecks_employee() {
    let conn = open_db_in_memory().unwrap();
    let acme = common::company(&conn, "Acme");
    let globex = common::company(&conn, "Globex");
    let alice = common::hr(&conn, &acme, "alice");
    let bob = common::employee(&conn, &acme, "bob");
    let carol = common::employee(&conn, &acme, "carol");
    let dave = common::employee(&conn, &globex, "dave");
    let (_, onboarding) = task_service(&conn)
        .start_onboarding(
            NewTask::new(
                acme.id,
                bob.id,
                alice.id,
                "Welcome Bob",
                common::date(2024, 1, 15),
                TaskCategory::Onboarding,
            ),
            bob.id,
            ["Sign contract"],
        )
        .unwrap();
    let repo = SqliteOnboardingRepository::try_new(&conn).unwrap();

    let to_hr = repo
        .update_onboarding(
            onboarding.id,
            OnboardingPatch {
                employee_id: Some(alice.id),
                ..OnboardingPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        to_hr,
        RepoError::ReferentialIntegrity {
            field: "employee_id",
            reason: IntegrityReason::RoleMismatch {
                expected: Role::Employee,
                actual: Role::Hr,
            },
        }
    ));

    let to_outsider = repo
        .update_onboarding(
            onboarding.id,
            OnboardingPatch {
                employee_id: Some(dave.id),
                ..OnboardingPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        to_outsider,
        RepoError::ReferentialIntegrity {
            field: "employee_id",
            reason: IntegrityReason::CrossTenant { .. },
        }
    ));

    let reassigned = repo
        .update_onboarding(
            onboarding.id,
            OnboardingPatch {
                employee_id: Some(carol.id),
                steps: Some(vec![
                    OnboardingStep::open("Sign contract"),
                    OnboardingStep::open("Meet buddy"),
                ]),
                ..OnboardingPatch::default()
            },
        )
        .unwrap();
    assert_eq!(reassigned.employee_id, carol.id);
    assert_eq!(
        repo.get_onboarding(onboarding.id).unwrap(),
        Some(reassigned)
    );
}

#[test]
fn step_updates_from_separate_connections_both_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hrdesk.sqlite3");
    let conn_a = open_db(&path).unwrap();
    let conn_b = open_db(&path).unwrap();
    let acme = common::company(&conn_a, "Acme");
    let alice = common::hr(&conn_a, &acme, "alice");
    let bob = common::employee(&conn_a, &acme, "bob");
    let (_, onboarding) = task_service(&conn_a)
        .start_onboarding(
            NewTask::new(
                acme.id,
                bob.id,
                alice.id,
                "Welcome Bob",
                common::date(2024, 1, 15),
                TaskCategory::Onboarding,
            ),
            bob.id,
            ["Sign contract", "Setup laptop"],
        )
        .unwrap();

    let repo_a = SqliteOnboardingRepository::try_new(&conn_a).unwrap();
    let repo_b = SqliteOnboardingRepository::try_new(&conn_b).unwrap();
    repo_a.set_onboarding_step(onboarding.id, 0, true).unwrap();
    let StepUpdate::Updated(last) = repo_b.set_onboarding_step(onboarding.id, 1, true).unwrap()
    else {
        panic!("step 1 should be in range");
    };
    assert!(last.all_steps_completed());
    assert!(last.completed_at.is_some());

    let stored = repo_a.get_onboarding(onboarding.id).unwrap().unwrap();
    assert_eq!(stored, last);

    assert_eq!(
        repo_b.set_onboarding_step(onboarding.id, 2, true).unwrap(),
        StepUpdate::OutOfRange { len: 2 }
    );
}

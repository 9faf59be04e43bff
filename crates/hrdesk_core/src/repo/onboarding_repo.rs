//! Onboarding repository contracts and SQLite implementation.
//!
//! # Invariants
//! - At most one onboarding per task (unique `task_id`).
//! - `employee_id` is an `employee` of the task's company.

use crate::model::choice::Role;
use crate::model::now_millis;
use crate::model::onboarding::{NewOnboarding, Onboarding, OnboardingId, OnboardingPatch};
use crate::model::task::TaskId;
use crate::model::user::UserId;
use crate::repo::codec::{
    id_to_db, json_to_db, opt_timestamp_to_db, row_id, row_json, row_opt_timestamp,
};
use crate::repo::guard::{require_task, require_user, UserRule};
use crate::repo::{ensure_connection_ready, push_page, with_write_tx, Page, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ONBOARDING_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    employee_id,
    steps,
    completed_at
FROM onboardings";

/// Query options for listing onboardings.
#[derive(Debug, Clone, Default)]
pub struct OnboardingListQuery {
    pub employee_id: Option<UserId>,
    /// `Some(false)` returns onboardings without `completed_at`.
    pub completed: Option<bool>,
    pub page: Page,
}

/// Outcome of toggling one checklist step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepUpdate {
    Updated(Onboarding),
    OutOfRange { len: usize },
}

/// Repository interface for onboarding checklists.
pub trait OnboardingRepository {
    fn create_onboarding(&self, new: NewOnboarding) -> RepoResult<Onboarding>;
    fn get_onboarding(&self, id: OnboardingId) -> RepoResult<Option<Onboarding>>;
    fn find_onboarding_by_task(&self, task_id: TaskId) -> RepoResult<Option<Onboarding>>;
    fn list_onboardings(&self, query: &OnboardingListQuery) -> RepoResult<Vec<Onboarding>>;
    fn update_onboarding(
        &self,
        id: OnboardingId,
        patch: OnboardingPatch,
    ) -> RepoResult<Onboarding>;
    /// Read-modify-write of one step inside a single write transaction.
    fn set_onboarding_step(
        &self,
        id: OnboardingId,
        index: usize,
        completed: bool,
    ) -> RepoResult<StepUpdate>;
    fn delete_onboarding(&self, id: OnboardingId) -> RepoResult<()>;
}

/// SQLite-backed onboarding repository.
pub struct SqliteOnboardingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOnboardingRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "tasks", "onboardings"])?;
        Ok(Self { conn })
    }
}

impl OnboardingRepository for SqliteOnboardingRepository<'_> {
    fn create_onboarding(&self, new: NewOnboarding) -> RepoResult<Onboarding> {
        with_write_tx(self.conn, |conn| insert_onboarding(conn, new))
    }

    fn get_onboarding(&self, id: OnboardingId) -> RepoResult<Option<Onboarding>> {
        get_onboarding_in(self.conn, id)
    }

    fn find_onboarding_by_task(&self, task_id: TaskId) -> RepoResult<Option<Onboarding>> {
        find_onboarding_where(self.conn, "task_id", &id_to_db(task_id))
    }

    fn list_onboardings(&self, query: &OnboardingListQuery) -> RepoResult<Vec<Onboarding>> {
        let mut sql = format!("{ONBOARDING_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(employee_id) = query.employee_id {
            sql.push_str(" AND employee_id = ?");
            bind_values.push(Value::Text(id_to_db(employee_id)));
        }
        match query.completed {
            Some(true) => sql.push_str(" AND completed_at IS NOT NULL"),
            Some(false) => sql.push_str(" AND completed_at IS NULL"),
            None => {}
        }

        sql.push_str(" ORDER BY id ASC");
        push_page(&mut sql, &mut bind_values, query.page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut onboardings = Vec::new();
        while let Some(row) = rows.next()? {
            onboardings.push(parse_onboarding_row(row)?);
        }
        Ok(onboardings)
    }

    fn update_onboarding(
        &self,
        id: OnboardingId,
        patch: OnboardingPatch,
    ) -> RepoResult<Onboarding> {
        with_write_tx(self.conn, |conn| {
            let mut onboarding = get_onboarding_in(conn, id)?
                .ok_or_else(|| RepoError::not_found("onboarding", id))?;
            onboarding.apply(patch);
            onboarding.validate()?;
            check_links(conn, &onboarding)?;

            conn.execute(
                "UPDATE onboardings
                 SET
                    employee_id = ?1,
                    steps = ?2,
                    completed_at = ?3
                 WHERE id = ?4;",
                params![
                    id_to_db(onboarding.employee_id),
                    json_to_db("steps", &onboarding.steps)?,
                    opt_timestamp_to_db(onboarding.completed_at),
                    id_to_db(onboarding.id),
                ],
            )?;
            Ok(onboarding)
        })
    }

    fn set_onboarding_step(
        &self,
        id: OnboardingId,
        index: usize,
        completed: bool,
    ) -> RepoResult<StepUpdate> {
        with_write_tx(self.conn, |conn| {
            let mut onboarding = get_onboarding_in(conn, id)?
                .ok_or_else(|| RepoError::not_found("onboarding", id))?;
            if !onboarding.set_step(index, completed, now_millis()) {
                return Ok(StepUpdate::OutOfRange {
                    len: onboarding.steps.len(),
                });
            }
            onboarding.validate()?;

            conn.execute(
                "UPDATE onboardings
                 SET
                    steps = ?1,
                    completed_at = ?2
                 WHERE id = ?3;",
                params![
                    json_to_db("steps", &onboarding.steps)?,
                    opt_timestamp_to_db(onboarding.completed_at),
                    id_to_db(onboarding.id),
                ],
            )?;
            Ok(StepUpdate::Updated(onboarding))
        })
    }

    fn delete_onboarding(&self, id: OnboardingId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM onboardings WHERE id = ?1;", [id_to_db(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found("onboarding", id));
        }
        Ok(())
    }
}

/// Validates and inserts one onboarding. Callers own the transaction.
pub(crate) fn insert_onboarding(conn: &Connection, new: NewOnboarding) -> RepoResult<Onboarding> {
    let onboarding = new.build();
    onboarding.validate()?;
    check_links(conn, &onboarding)?;

    conn.execute(
        "INSERT INTO onboardings (
            id,
            task_id,
            employee_id,
            steps,
            completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            id_to_db(onboarding.id),
            id_to_db(onboarding.task_id),
            id_to_db(onboarding.employee_id),
            json_to_db("steps", &onboarding.steps)?,
            opt_timestamp_to_db(onboarding.completed_at),
        ],
    )?;
    Ok(onboarding)
}

fn check_links(conn: &Connection, onboarding: &Onboarding) -> RepoResult<()> {
    let company_id = require_task(conn, "task_id", onboarding.task_id)?;
    require_user(
        conn,
        "employee_id",
        onboarding.employee_id,
        UserRule::in_company(company_id).with_role(Role::Employee),
    )?;
    Ok(())
}

fn get_onboarding_in(conn: &Connection, id: OnboardingId) -> RepoResult<Option<Onboarding>> {
    find_onboarding_where(conn, "id", &id_to_db(id))
}

fn find_onboarding_where(
    conn: &Connection,
    column: &'static str,
    value: &str,
) -> RepoResult<Option<Onboarding>> {
    let mut stmt = conn.prepare(&format!("{ONBOARDING_SELECT_SQL} WHERE {column} = ?1;"))?;
    let mut rows = stmt.query([value])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_onboarding_row(row)?));
    }
    Ok(None)
}

fn parse_onboarding_row(row: &Row<'_>) -> RepoResult<Onboarding> {
    Ok(Onboarding {
        id: row_id(row, "id")?,
        task_id: row_id(row, "task_id")?,
        employee_id: row_id(row, "employee_id")?,
        steps: row_json(row, "steps")?,
        completed_at: row_opt_timestamp(row, "completed_at")?,
    })
}

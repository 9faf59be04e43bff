//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `tasks`.
//! - Create an onboarding task together with its checklist atomically.
//!
//! # Invariants
//! - `created_by` is an `hr` user of the task's company.
//! - `assigned_to` belongs to the task's company.
//! - Every persisted update refreshes `updated_at`.

use crate::model::choice::{Role, TaskCategory, TaskStatus};
use crate::model::company::CompanyId;
use crate::model::now_millis;
use crate::model::onboarding::{NewOnboarding, Onboarding};
use crate::model::payload::OnboardingStep;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::model::user::UserId;
use crate::repo::codec::{id_to_db, row_choice, row_id, row_timestamp, timestamp_to_db};
use crate::repo::guard::{require_company, require_user, UserRule};
use crate::repo::onboarding_repo::insert_onboarding;
use crate::repo::{ensure_connection_ready, push_page, with_write_tx, Page, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    company_id,
    assigned_to,
    created_by,
    title,
    description,
    due_date,
    status,
    priority,
    category,
    created_at,
    updated_at
FROM tasks";

/// Query options for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub company_id: Option<CompanyId>,
    pub assigned_to: Option<UserId>,
    pub created_by: Option<UserId>,
    pub status: Option<TaskStatus>,
    pub category: Option<TaskCategory>,
    pub page: Page,
}

/// Repository interface for task operations.
pub trait TaskRepository {
    fn create_task(&self, new: NewTask) -> RepoResult<Task>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn update_task(&self, id: TaskId, patch: TaskPatch) -> RepoResult<Task>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Creates an `onboarding` task and its checklist in one transaction.
    fn create_onboarding_task(
        &self,
        new: NewTask,
        employee_id: UserId,
        steps: Vec<OnboardingStep>,
    ) -> RepoResult<(Task, Onboarding)>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["companies", "users", "tasks", "onboardings"])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, new: NewTask) -> RepoResult<Task> {
        with_write_tx(self.conn, |conn| insert_task(conn, new))
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        get_task_in(self.conn, id)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(company_id) = query.company_id {
            sql.push_str(" AND company_id = ?");
            bind_values.push(Value::Text(id_to_db(company_id)));
        }
        if let Some(assigned_to) = query.assigned_to {
            sql.push_str(" AND assigned_to = ?");
            bind_values.push(Value::Text(id_to_db(assigned_to)));
        }
        if let Some(created_by) = query.created_by {
            sql.push_str(" AND created_by = ?");
            bind_values.push(Value::Text(id_to_db(created_by)));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }

        sql.push_str(" ORDER BY due_date ASC, created_at ASC, id ASC");
        push_page(&mut sql, &mut bind_values, query.page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn update_task(&self, id: TaskId, patch: TaskPatch) -> RepoResult<Task> {
        with_write_tx(self.conn, |conn| {
            let mut task = get_task_in(conn, id)?.ok_or_else(|| RepoError::not_found("task", id))?;
            task.apply(patch);
            task.validate()?;
            check_links(conn, &task)?;
            task.updated_at = now_millis();

            conn.execute(
                "UPDATE tasks
                 SET
                    assigned_to = ?1,
                    created_by = ?2,
                    title = ?3,
                    description = ?4,
                    due_date = ?5,
                    status = ?6,
                    priority = ?7,
                    category = ?8,
                    updated_at = ?9
                 WHERE id = ?10;",
                params![
                    id_to_db(task.assigned_to),
                    id_to_db(task.created_by),
                    task.title.as_str(),
                    task.description.as_str(),
                    task.due_date,
                    task.status.as_str(),
                    task.priority.as_str(),
                    task.category.as_str(),
                    timestamp_to_db(task.updated_at),
                    id_to_db(task.id),
                ],
            )?;
            Ok(task)
        })
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id_to_db(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found("task", id));
        }
        Ok(())
    }

    fn create_onboarding_task(
        &self,
        new: NewTask,
        employee_id: UserId,
        steps: Vec<OnboardingStep>,
    ) -> RepoResult<(Task, Onboarding)> {
        let new = NewTask {
            category: TaskCategory::Onboarding,
            ..new
        };
        with_write_tx(self.conn, |conn| {
            let task = insert_task(conn, new)?;
            let onboarding = insert_onboarding(conn, NewOnboarding::new(task.id, employee_id, steps))?;
            Ok((task, onboarding))
        })
    }
}

fn insert_task(conn: &Connection, new: NewTask) -> RepoResult<Task> {
    let task = new.build(now_millis());
    task.validate()?;
    require_company(conn, "company_id", task.company_id)?;
    check_links(conn, &task)?;

    conn.execute(
        "INSERT INTO tasks (
            id,
            company_id,
            assigned_to,
            created_by,
            title,
            description,
            due_date,
            status,
            priority,
            category,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
        params![
            id_to_db(task.id),
            id_to_db(task.company_id),
            id_to_db(task.assigned_to),
            id_to_db(task.created_by),
            task.title.as_str(),
            task.description.as_str(),
            task.due_date,
            task.status.as_str(),
            task.priority.as_str(),
            task.category.as_str(),
            timestamp_to_db(task.created_at),
            timestamp_to_db(task.updated_at),
        ],
    )?;
    Ok(task)
}

fn check_links(conn: &Connection, task: &Task) -> RepoResult<()> {
    require_user(
        conn,
        "created_by",
        task.created_by,
        UserRule::in_company(task.company_id).with_role(Role::Hr),
    )?;
    require_user(
        conn,
        "assigned_to",
        task.assigned_to,
        UserRule::in_company(task.company_id),
    )?;
    Ok(())
}

fn get_task_in(conn: &Connection, id: TaskId) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id_to_db(id)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    Ok(Task {
        id: row_id(row, "id")?,
        company_id: row_id(row, "company_id")?,
        assigned_to: row_id(row, "assigned_to")?,
        created_by: row_id(row, "created_by")?,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        status: row_choice(row, "status")?,
        priority: row_choice(row, "priority")?,
        category: row_choice(row, "category")?,
        created_at: row_timestamp(row, "created_at")?,
        updated_at: row_timestamp(row, "updated_at")?,
    })
}

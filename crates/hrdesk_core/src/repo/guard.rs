//! Write-time reference checks that SQLite foreign keys cannot express.
//!
//! # Responsibility
//! - Reject links to missing rows with a precise field name.
//! - Enforce role-scoped links (e.g. `created_by` must be `hr`).
//! - Enforce tenant isolation: linked users/tasks share the owner's company.
//!
//! # Invariants
//! - Guards only read; callers run them inside the write transaction.

use crate::model::choice::Role;
use crate::model::company::CompanyId;
use crate::model::task::TaskId;
use crate::model::user::UserId;
use crate::repo::codec::{id_to_db, row_choice, row_id};
use crate::repo::{IntegrityReason, RepoError, RepoResult};
use rusqlite::{Connection, OptionalExtension};

struct ScopedLink {
    table: &'static str,
    column: &'static str,
    label: &'static str,
}

const fn link(table: &'static str, column: &'static str, label: &'static str) -> ScopedLink {
    ScopedLink {
        table,
        column,
        label,
    }
}

/// Links that require the target user to hold `hr`.
const HR_SCOPED_LINKS: &[ScopedLink] = &[
    link("invitations", "invited_by", "invitations.invited_by"),
    link("tasks", "created_by", "tasks.created_by"),
    link("leave_requests", "approved_by", "leave_requests.approved_by"),
    link("reports", "generated_by", "reports.generated_by"),
];

/// Links that require the target user to hold `employee`.
const EMPLOYEE_SCOPED_LINKS: &[ScopedLink] = &[
    link("onboardings", "employee_id", "onboardings.employee_id"),
    link("leave_requests", "employee_id", "leave_requests.employee_id"),
    link("payrolls", "employee_id", "payrolls.employee_id"),
];

/// Minimal view of a user row used by guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UserRef {
    pub id: UserId,
    pub company_id: CompanyId,
    pub role: Role,
}

/// Requirements checked by `require_user`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct UserRule {
    pub role: Option<Role>,
    pub company_id: Option<CompanyId>,
}

impl UserRule {
    pub fn in_company(company_id: CompanyId) -> Self {
        Self {
            role: None,
            company_id: Some(company_id),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

pub(crate) fn load_user_ref(conn: &Connection, id: UserId) -> RepoResult<Option<UserRef>> {
    let mut stmt = conn.prepare("SELECT id, company_id, role FROM users WHERE id = ?1;")?;
    let mut rows = stmt.query([id_to_db(id)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(UserRef {
            id: row_id(row, "id")?,
            company_id: row_id(row, "company_id")?,
            role: row_choice(row, "role")?,
        }));
    }
    Ok(None)
}

/// Loads the user behind `field` and checks it against `rule`.
pub(crate) fn require_user(
    conn: &Connection,
    field: &'static str,
    id: UserId,
    rule: UserRule,
) -> RepoResult<UserRef> {
    let user = load_user_ref(conn, id)?.ok_or_else(|| RepoError::ReferentialIntegrity {
        field,
        reason: IntegrityReason::MissingTarget(id.to_string()),
    })?;

    if let Some(expected) = rule.role {
        if user.role != expected {
            return Err(RepoError::ReferentialIntegrity {
                field,
                reason: IntegrityReason::RoleMismatch {
                    expected,
                    actual: user.role,
                },
            });
        }
    }

    if let Some(expected) = rule.company_id {
        if user.company_id != expected {
            return Err(RepoError::ReferentialIntegrity {
                field,
                reason: IntegrityReason::CrossTenant {
                    expected,
                    actual: user.company_id,
                },
            });
        }
    }

    Ok(user)
}

pub(crate) fn require_company(
    conn: &Connection,
    field: &'static str,
    id: CompanyId,
) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM companies WHERE id = ?1);",
        [id_to_db(id)],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::ReferentialIntegrity {
            field,
            reason: IntegrityReason::MissingTarget(id.to_string()),
        });
    }
    Ok(())
}

/// Returns the owning company of the task behind `field`.
pub(crate) fn require_task(
    conn: &Connection,
    field: &'static str,
    id: TaskId,
) -> RepoResult<CompanyId> {
    let company: Option<String> = conn
        .query_row(
            "SELECT company_id FROM tasks WHERE id = ?1;",
            [id_to_db(id)],
            |row| row.get(0),
        )
        .optional()?;
    match company {
        Some(text) => uuid::Uuid::parse_str(&text).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{text}` in tasks.company_id"))
        }),
        None => Err(RepoError::ReferentialIntegrity {
            field,
            reason: IntegrityReason::MissingTarget(id.to_string()),
        }),
    }
}

/// Refuses a role change while role-scoped links still require the old role.
pub(crate) fn ensure_role_change_allowed(
    conn: &Connection,
    user_id: UserId,
    old_role: Role,
    new_role: Role,
) -> RepoResult<()> {
    if old_role == new_role {
        return Ok(());
    }

    let links = match old_role {
        Role::Hr => HR_SCOPED_LINKS,
        Role::Employee => EMPLOYEE_SCOPED_LINKS,
    };
    let id_text = id_to_db(user_id);
    for scoped in links {
        let referenced: i64 = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1);",
                scoped.table, scoped.column
            ),
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        if referenced == 1 {
            return Err(RepoError::ReferentialIntegrity {
                field: "role",
                reason: IntegrityReason::RoleStillReferenced {
                    role: old_role,
                    referenced_by: scoped.label,
                },
            });
        }
    }
    Ok(())
}

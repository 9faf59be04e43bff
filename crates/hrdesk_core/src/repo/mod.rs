//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one CRUD contract per entity plus its SQLite implementation.
//! - Isolate SQLite query details from service/business orchestration.
//! - Translate storage failures into the schema error taxonomy.
//!
//! # Invariants
//! - Write paths validate the merged record before SQL mutations.
//! - Role-scoped and tenant-scoped references are checked inside the same
//!   immediate transaction as the write.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod company_repo;
pub mod contract_repo;
pub mod invitation_repo;
pub mod leave_repo;
pub mod onboarding_repo;
pub mod payroll_repo;
pub mod report_repo;
pub mod task_repo;
pub mod user_repo;

mod codec;
mod guard;

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::choice::Role;
use crate::model::company::CompanyId;
use crate::model::validation::ValidationError;
use rusqlite::ffi;
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Why a reference to another row was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityReason {
    /// Target row does not exist.
    MissingTarget(String),
    /// Target user holds a different role than the link requires.
    RoleMismatch { expected: Role, actual: Role },
    /// Target row belongs to another company.
    CrossTenant {
        expected: CompanyId,
        actual: CompanyId,
    },
    /// Role change refused while a role-scoped link still points at the user.
    RoleStillReferenced { role: Role, referenced_by: &'static str },
    /// Foreign key rejected by storage.
    Storage(String),
}

impl Display for IntegrityReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTarget(id) => write!(f, "target {id} does not exist"),
            Self::RoleMismatch { expected, actual } => {
                write!(f, "target must have role `{expected}`, has `{actual}`")
            }
            Self::CrossTenant { expected, actual } => write!(
                f,
                "target belongs to company {actual}, expected company {expected}"
            ),
            Self::RoleStillReferenced {
                role,
                referenced_by,
            } => write!(f, "user is still referenced as `{role}` by {referenced_by}"),
            Self::Storage(message) => write!(f, "{message}"),
        }
    }
}

/// Error taxonomy for every repository operation.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Uniqueness, not-null, check or trigger violation.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("referential integrity violation on `{field}`: {reason}")]
    ReferentialIntegrity {
        field: &'static str,
        reason: IntegrityReason,
    },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Db(#[from] DbError),
    /// Connection schema is not at the expected migrated version.
    #[error("repository requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("repository requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("repository requires `PRAGMA foreign_keys = ON`")]
    ForeignKeysDisabled,
    /// Persisted data cannot be converted to a valid record.
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether this error is a uniqueness/not-null/check violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                let message = message.unwrap_or_else(|| failure.to_string());
                if failure.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                    Self::ReferentialIntegrity {
                        field: "foreign_key",
                        reason: IntegrityReason::Storage(message),
                    }
                } else {
                    Self::ConstraintViolation(message)
                }
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Pagination shared by list queries. `limit = None` returns all rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }
}

pub(crate) fn push_page(sql: &mut String, bind_values: &mut Vec<Value>, page: Page) {
    if let Some(limit) = page.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if page.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(page.offset)));
        }
    } else if page.offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(page.offset)));
    }
}

/// Runs `work` inside an IMMEDIATE transaction on a shared connection.
///
/// Rolls back when `work` fails. Must not be nested.
pub(crate) fn with_write_tx<T>(
    conn: &Connection,
    work: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = work(&*tx)?;
    tx.commit()?;
    Ok(value)
}

/// Verifies that `conn` is migrated and enforces foreign keys.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    if foreign_keys != 1 {
        return Err(RepoError::ForeignKeysDisabled);
    }

    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

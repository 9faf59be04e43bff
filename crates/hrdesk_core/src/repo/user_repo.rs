//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `users` plus lookup by unique username.
//! - Guard inviter links and role changes.
//!
//! # Invariants
//! - `username` is unique across all companies.
//! - `invited_by`, when set, points at a user of the same company.
//! - A role change is refused while a role-scoped link still requires the
//!   old role.
//! - Deleting a user nulls `invited_by`/`approved_by` links and cascades
//!   everything the user owns.

use crate::model::choice::Role;
use crate::model::company::CompanyId;
use crate::model::now_millis;
use crate::model::user::{NewUser, User, UserId, UserPatch};
use crate::repo::codec::{
    bool_to_db, id_to_db, opt_document_to_db, opt_id_to_db, row_bool, row_choice, row_id,
    row_opt_document, row_opt_id, row_timestamp, timestamp_to_db,
};
use crate::repo::guard::{ensure_role_change_allowed, require_company, require_user, UserRule};
use crate::repo::{ensure_connection_ready, push_page, with_write_tx, Page, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    company_id,
    username,
    email,
    first_name,
    last_name,
    role,
    is_active,
    is_verified,
    employee_id,
    verification_document,
    invited_by,
    date_joined_company,
    date_joined
FROM users";

/// Query options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub company_id: Option<CompanyId>,
    pub role: Option<Role>,
    pub is_verified: Option<bool>,
    pub page: Page,
}

/// Repository interface for user CRUD operations.
pub trait UserRepository {
    fn create_user(&self, new: NewUser) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>>;
    fn update_user(&self, id: UserId, patch: UserPatch) -> RepoResult<User>;
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["companies", "users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, new: NewUser) -> RepoResult<User> {
        with_write_tx(self.conn, |conn| insert_user(conn, new))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        get_user_in(self.conn, id)
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        find_user_where(self.conn, "username", username)
    }

    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>> {
        let mut sql = format!("{USER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(company_id) = query.company_id {
            sql.push_str(" AND company_id = ?");
            bind_values.push(Value::Text(id_to_db(company_id)));
        }
        if let Some(role) = query.role {
            sql.push_str(" AND role = ?");
            bind_values.push(Value::Text(role.as_str().to_string()));
        }
        if let Some(is_verified) = query.is_verified {
            sql.push_str(" AND is_verified = ?");
            bind_values.push(Value::Integer(bool_to_db(is_verified)));
        }

        sql.push_str(" ORDER BY username ASC, id ASC");
        push_page(&mut sql, &mut bind_values, query.page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn update_user(&self, id: UserId, patch: UserPatch) -> RepoResult<User> {
        with_write_tx(self.conn, |conn| {
            let mut user = get_user_in(conn, id)?.ok_or_else(|| RepoError::not_found("user", id))?;
            let old_role = user.role;
            user.apply(patch);
            user.validate()?;

            ensure_role_change_allowed(conn, user.id, old_role, user.role)?;
            check_inviter(conn, &user)?;

            conn.execute(
                "UPDATE users
                 SET
                    username = ?1,
                    email = ?2,
                    first_name = ?3,
                    last_name = ?4,
                    role = ?5,
                    is_active = ?6,
                    is_verified = ?7,
                    employee_id = ?8,
                    verification_document = ?9,
                    invited_by = ?10,
                    date_joined_company = ?11
                 WHERE id = ?12;",
                params![
                    user.username.as_str(),
                    user.email.as_deref(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                    user.role.as_str(),
                    bool_to_db(user.is_active),
                    bool_to_db(user.is_verified),
                    user.employee_id.as_deref(),
                    opt_document_to_db(user.verification_document.as_ref()),
                    opt_id_to_db(user.invited_by),
                    user.date_joined_company,
                    id_to_db(user.id),
                ],
            )?;
            Ok(user)
        })
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id_to_db(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found("user", id));
        }
        Ok(())
    }
}

/// Validates and inserts one user. Callers own the transaction.
pub(crate) fn insert_user(conn: &Connection, new: NewUser) -> RepoResult<User> {
    let user = new.build(now_millis());
    user.validate()?;
    require_company(conn, "company_id", user.company_id)?;
    check_inviter(conn, &user)?;

    conn.execute(
        "INSERT INTO users (
            id,
            company_id,
            username,
            email,
            first_name,
            last_name,
            role,
            is_active,
            is_verified,
            employee_id,
            verification_document,
            invited_by,
            date_joined_company,
            date_joined
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
        params![
            id_to_db(user.id),
            id_to_db(user.company_id),
            user.username.as_str(),
            user.email.as_deref(),
            user.first_name.as_str(),
            user.last_name.as_str(),
            user.role.as_str(),
            bool_to_db(user.is_active),
            bool_to_db(user.is_verified),
            user.employee_id.as_deref(),
            opt_document_to_db(user.verification_document.as_ref()),
            opt_id_to_db(user.invited_by),
            user.date_joined_company,
            timestamp_to_db(user.date_joined),
        ],
    )?;

    Ok(user)
}

fn check_inviter(conn: &Connection, user: &User) -> RepoResult<()> {
    if let Some(inviter) = user.invited_by {
        require_user(conn, "invited_by", inviter, UserRule::in_company(user.company_id))?;
    }
    Ok(())
}

pub(crate) fn get_user_in(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    find_user_where(conn, "id", &id_to_db(id))
}

fn find_user_where(
    conn: &Connection,
    column: &'static str,
    value: &str,
) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE {column} = ?1;"))?;
    let mut rows = stmt.query([value])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let user = User {
        id: row_id(row, "id")?,
        company_id: row_id(row, "company_id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        role: row_choice(row, "role")?,
        is_active: row_bool(row, "is_active")?,
        is_verified: row_bool(row, "is_verified")?,
        employee_id: row.get("employee_id")?,
        verification_document: row_opt_document(row, "verification_document")?,
        invited_by: row_opt_id(row, "invited_by")?,
        date_joined_company: row.get("date_joined_company")?,
        date_joined: row_timestamp(row, "date_joined")?,
    };
    Ok(user)
}

//! Invitation repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `invitations` plus lookup by unique token.
//! - Redeem an invitation and create the invited account atomically.
//!
//! # Invariants
//! - `invited_by` must be an `hr` user of the invitation's company.
//! - `is_used` only moves `false -> true` (also guarded by a trigger).
//! - Redemption never succeeds for a used or expired invitation.

use crate::model::choice::Role;
use crate::model::company::CompanyId;
use crate::model::invitation::{Invitation, InvitationId, InvitationPatch, NewInvitation};
use crate::model::now_millis;
use crate::model::user::{NewUser, User};
use crate::repo::codec::{bool_to_db, id_to_db, row_bool, row_id, row_timestamp, timestamp_to_db};
use crate::repo::guard::{require_company, require_user, UserRule};
use crate::repo::user_repo::insert_user;
use crate::repo::{ensure_connection_ready, push_page, with_write_tx, Page, RepoError, RepoResult};
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const INVITATION_SELECT_SQL: &str = "SELECT
    id,
    company_id,
    invited_email,
    invited_by,
    token,
    is_used,
    expires_at,
    created_at
FROM invitations";

/// Query options for listing invitations.
#[derive(Debug, Clone, Default)]
pub struct InvitationListQuery {
    pub company_id: Option<CompanyId>,
    pub is_used: Option<bool>,
    pub page: Page,
}

/// Repository interface for invitation operations.
pub trait InvitationRepository {
    /// Creates an invitation; `expires_at` defaults to `created_at + ttl`.
    fn create_invitation(&self, new: NewInvitation, ttl: TimeDelta) -> RepoResult<Invitation>;
    fn get_invitation(&self, id: InvitationId) -> RepoResult<Option<Invitation>>;
    fn find_invitation_by_token(&self, token: &str) -> RepoResult<Option<Invitation>>;
    fn list_invitations(&self, query: &InvitationListQuery) -> RepoResult<Vec<Invitation>>;
    fn update_invitation(
        &self,
        id: InvitationId,
        patch: InvitationPatch,
    ) -> RepoResult<Invitation>;
    /// Marks the invitation used and creates `signup` in one transaction.
    ///
    /// The created user is forced into the invitation's company, with the
    /// `employee` role, verified, and `invited_by` set to the issuer.
    fn redeem_invitation(
        &self,
        id: InvitationId,
        signup: NewUser,
        now: DateTime<Utc>,
    ) -> RepoResult<(Invitation, User)>;
    fn delete_invitation(&self, id: InvitationId) -> RepoResult<()>;
}

/// SQLite-backed invitation repository.
pub struct SqliteInvitationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInvitationRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["companies", "users", "invitations"])?;
        Ok(Self { conn })
    }
}

impl InvitationRepository for SqliteInvitationRepository<'_> {
    fn create_invitation(&self, new: NewInvitation, ttl: TimeDelta) -> RepoResult<Invitation> {
        with_write_tx(self.conn, |conn| {
            let invitation = new.build(now_millis(), ttl);
            invitation.validate()?;
            require_company(conn, "company_id", invitation.company_id)?;
            check_issuer(conn, &invitation)?;

            conn.execute(
                "INSERT INTO invitations (
                    id,
                    company_id,
                    invited_email,
                    invited_by,
                    token,
                    is_used,
                    expires_at,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    id_to_db(invitation.id),
                    id_to_db(invitation.company_id),
                    invitation.invited_email.as_str(),
                    id_to_db(invitation.invited_by),
                    invitation.token.as_str(),
                    bool_to_db(invitation.is_used),
                    timestamp_to_db(invitation.expires_at),
                    timestamp_to_db(invitation.created_at),
                ],
            )?;
            Ok(invitation)
        })
    }

    fn get_invitation(&self, id: InvitationId) -> RepoResult<Option<Invitation>> {
        get_invitation_in(self.conn, id)
    }

    fn find_invitation_by_token(&self, token: &str) -> RepoResult<Option<Invitation>> {
        find_invitation_where(self.conn, "token", token)
    }

    fn list_invitations(&self, query: &InvitationListQuery) -> RepoResult<Vec<Invitation>> {
        let mut sql = format!("{INVITATION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(company_id) = query.company_id {
            sql.push_str(" AND company_id = ?");
            bind_values.push(Value::Text(id_to_db(company_id)));
        }
        if let Some(is_used) = query.is_used {
            sql.push_str(" AND is_used = ?");
            bind_values.push(Value::Integer(bool_to_db(is_used)));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");
        push_page(&mut sql, &mut bind_values, query.page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut invitations = Vec::new();
        while let Some(row) = rows.next()? {
            invitations.push(parse_invitation_row(row)?);
        }
        Ok(invitations)
    }

    fn update_invitation(
        &self,
        id: InvitationId,
        patch: InvitationPatch,
    ) -> RepoResult<Invitation> {
        with_write_tx(self.conn, |conn| {
            let mut invitation = get_invitation_in(conn, id)?
                .ok_or_else(|| RepoError::not_found("invitation", id))?;
            invitation.apply(patch);
            invitation.validate()?;
            check_issuer(conn, &invitation)?;

            conn.execute(
                "UPDATE invitations
                 SET
                    invited_email = ?1,
                    expires_at = ?2
                 WHERE id = ?3;",
                params![
                    invitation.invited_email.as_str(),
                    timestamp_to_db(invitation.expires_at),
                    id_to_db(invitation.id),
                ],
            )?;
            Ok(invitation)
        })
    }

    fn redeem_invitation(
        &self,
        id: InvitationId,
        signup: NewUser,
        now: DateTime<Utc>,
    ) -> RepoResult<(Invitation, User)> {
        with_write_tx(self.conn, |conn| {
            let changed = conn.execute(
                "UPDATE invitations
                 SET is_used = 1
                 WHERE id = ?1
                   AND is_used = 0
                   AND expires_at > ?2;",
                params![id_to_db(id), timestamp_to_db(now)],
            )?;
            let invitation = get_invitation_in(conn, id)?
                .ok_or_else(|| RepoError::not_found("invitation", id))?;
            if changed == 0 {
                return Err(RepoError::ConstraintViolation(format!(
                    "invitation {id} is already used or expired"
                )));
            }

            let signup = NewUser {
                company_id: invitation.company_id,
                role: Role::Employee,
                is_verified: true,
                invited_by: Some(invitation.invited_by),
                ..signup
            };
            let user = insert_user(conn, signup)?;
            Ok((invitation, user))
        })
    }

    fn delete_invitation(&self, id: InvitationId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM invitations WHERE id = ?1;", [id_to_db(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found("invitation", id));
        }
        Ok(())
    }
}

fn check_issuer(conn: &Connection, invitation: &Invitation) -> RepoResult<()> {
    require_user(
        conn,
        "invited_by",
        invitation.invited_by,
        UserRule::in_company(invitation.company_id).with_role(Role::Hr),
    )?;
    Ok(())
}

fn get_invitation_in(conn: &Connection, id: InvitationId) -> RepoResult<Option<Invitation>> {
    find_invitation_where(conn, "id", &id_to_db(id))
}

fn find_invitation_where(
    conn: &Connection,
    column: &'static str,
    value: &str,
) -> RepoResult<Option<Invitation>> {
    let mut stmt = conn.prepare(&format!("{INVITATION_SELECT_SQL} WHERE {column} = ?1;"))?;
    let mut rows = stmt.query([value])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_invitation_row(row)?));
    }
    Ok(None)
}

fn parse_invitation_row(row: &Row<'_>) -> RepoResult<Invitation> {
    Ok(Invitation {
        id: row_id(row, "id")?,
        company_id: row_id(row, "company_id")?,
        invited_email: row.get("invited_email")?,
        invited_by: row_id(row, "invited_by")?,
        token: row.get("token")?,
        is_used: row_bool(row, "is_used")?,
        expires_at: row_timestamp(row, "expires_at")?,
        created_at: row_timestamp(row, "created_at")?,
    })
}

//! Leave request repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `employee_id` holds the `employee` role.
//! - `approved_by`, when set, is an `hr` user of the employee's company.
//! - Deleting the approver nulls `approved_by`; deleting the employee
//!   deletes the request.

use crate::model::choice::{LeaveStatus, Role};
use crate::model::company::CompanyId;
use crate::model::leave::{LeaveRequest, LeaveRequestId, LeaveRequestPatch, NewLeaveRequest};
use crate::model::user::UserId;
use crate::repo::codec::{id_to_db, opt_id_to_db, row_choice, row_id, row_opt_id};
use crate::repo::guard::{require_user, UserRule};
use crate::repo::{ensure_connection_ready, push_page, with_write_tx, Page, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const LEAVE_SELECT_SQL: &str = "SELECT
    l.id,
    l.employee_id,
    l.leave_type,
    l.start_date,
    l.end_date,
    l.status,
    l.approved_by
FROM leave_requests l";

/// Query options for listing leave requests.
#[derive(Debug, Clone, Default)]
pub struct LeaveListQuery {
    /// Filters through the requesting employee's company.
    pub company_id: Option<CompanyId>,
    pub employee_id: Option<UserId>,
    pub status: Option<LeaveStatus>,
    pub page: Page,
}

/// Outcome of recording an hr decision on a leave request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveDecision {
    Decided(LeaveRequest),
    /// The request had already left `pending`; carries its current status.
    AlreadyDecided(LeaveStatus),
}

/// Repository interface for leave requests.
pub trait LeaveRepository {
    fn create_leave_request(&self, new: NewLeaveRequest) -> RepoResult<LeaveRequest>;
    fn get_leave_request(&self, id: LeaveRequestId) -> RepoResult<Option<LeaveRequest>>;
    fn list_leave_requests(&self, query: &LeaveListQuery) -> RepoResult<Vec<LeaveRequest>>;
    fn update_leave_request(
        &self,
        id: LeaveRequestId,
        patch: LeaveRequestPatch,
    ) -> RepoResult<LeaveRequest>;
    /// Moves a `pending` request to `status` with `approver` in one write
    /// transaction. Requests that are no longer pending are left untouched.
    fn decide_leave_request(
        &self,
        id: LeaveRequestId,
        status: LeaveStatus,
        approver: UserId,
    ) -> RepoResult<LeaveDecision>;
    fn delete_leave_request(&self, id: LeaveRequestId) -> RepoResult<()>;
}

/// SQLite-backed leave request repository.
pub struct SqliteLeaveRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLeaveRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "leave_requests"])?;
        Ok(Self { conn })
    }
}

impl LeaveRepository for SqliteLeaveRepository<'_> {
    fn create_leave_request(&self, new: NewLeaveRequest) -> RepoResult<LeaveRequest> {
        with_write_tx(self.conn, |conn| {
            let request = new.build();
            request.validate()?;
            check_links(conn, &request)?;

            conn.execute(
                "INSERT INTO leave_requests (
                    id,
                    employee_id,
                    leave_type,
                    start_date,
                    end_date,
                    status,
                    approved_by
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    id_to_db(request.id),
                    id_to_db(request.employee_id),
                    request.leave_type.as_str(),
                    request.start_date,
                    request.end_date,
                    request.status.as_str(),
                    opt_id_to_db(request.approved_by),
                ],
            )?;
            Ok(request)
        })
    }

    fn get_leave_request(&self, id: LeaveRequestId) -> RepoResult<Option<LeaveRequest>> {
        get_leave_request_in(self.conn, id)
    }

    fn list_leave_requests(&self, query: &LeaveListQuery) -> RepoResult<Vec<LeaveRequest>> {
        let mut sql = String::from(LEAVE_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(company_id) = query.company_id {
            sql.push_str(" JOIN users u ON u.id = l.employee_id WHERE u.company_id = ?");
            bind_values.push(Value::Text(id_to_db(company_id)));
        } else {
            sql.push_str(" WHERE 1 = 1");
        }
        if let Some(employee_id) = query.employee_id {
            sql.push_str(" AND l.employee_id = ?");
            bind_values.push(Value::Text(id_to_db(employee_id)));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND l.status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY l.start_date ASC, l.id ASC");
        push_page(&mut sql, &mut bind_values, query.page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next()? {
            requests.push(parse_leave_row(row)?);
        }
        Ok(requests)
    }

    fn update_leave_request(
        &self,
        id: LeaveRequestId,
        patch: LeaveRequestPatch,
    ) -> RepoResult<LeaveRequest> {
        with_write_tx(self.conn, |conn| {
            let mut request = get_leave_request_in(conn, id)?
                .ok_or_else(|| RepoError::not_found("leave_request", id))?;
            request.apply(patch);
            request.validate()?;
            check_links(conn, &request)?;

            conn.execute(
                "UPDATE leave_requests
                 SET
                    leave_type = ?1,
                    start_date = ?2,
                    end_date = ?3,
                    status = ?4,
                    approved_by = ?5
                 WHERE id = ?6;",
                params![
                    request.leave_type.as_str(),
                    request.start_date,
                    request.end_date,
                    request.status.as_str(),
                    opt_id_to_db(request.approved_by),
                    id_to_db(request.id),
                ],
            )?;
            Ok(request)
        })
    }

    fn decide_leave_request(
        &self,
        id: LeaveRequestId,
        status: LeaveStatus,
        approver: UserId,
    ) -> RepoResult<LeaveDecision> {
        with_write_tx(self.conn, |conn| {
            let mut request = get_leave_request_in(conn, id)?
                .ok_or_else(|| RepoError::not_found("leave_request", id))?;
            if request.status != LeaveStatus::Pending {
                return Ok(LeaveDecision::AlreadyDecided(request.status));
            }
            request.status = status;
            request.approved_by = Some(approver);
            request.validate()?;
            check_links(conn, &request)?;

            let changed = conn.execute(
                "UPDATE leave_requests
                 SET
                    status = ?1,
                    approved_by = ?2
                 WHERE id = ?3 AND status = ?4;",
                params![
                    status.as_str(),
                    id_to_db(approver),
                    id_to_db(id),
                    LeaveStatus::Pending.as_str(),
                ],
            )?;
            if changed == 0 {
                let current = get_leave_request_in(conn, id)?
                    .ok_or_else(|| RepoError::not_found("leave_request", id))?;
                return Ok(LeaveDecision::AlreadyDecided(current.status));
            }
            Ok(LeaveDecision::Decided(request))
        })
    }

    fn delete_leave_request(&self, id: LeaveRequestId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM leave_requests WHERE id = ?1;", [id_to_db(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found("leave_request", id));
        }
        Ok(())
    }
}

fn check_links(conn: &Connection, request: &LeaveRequest) -> RepoResult<()> {
    let employee = require_user(
        conn,
        "employee_id",
        request.employee_id,
        UserRule::default().with_role(Role::Employee),
    )?;
    if let Some(approver) = request.approved_by {
        require_user(
            conn,
            "approved_by",
            approver,
            UserRule::in_company(employee.company_id).with_role(Role::Hr),
        )?;
    }
    Ok(())
}

fn get_leave_request_in(
    conn: &Connection,
    id: LeaveRequestId,
) -> RepoResult<Option<LeaveRequest>> {
    let mut stmt = conn.prepare(&format!("{LEAVE_SELECT_SQL} WHERE l.id = ?1;"))?;
    let mut rows = stmt.query([id_to_db(id)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_leave_row(row)?));
    }
    Ok(None)
}

fn parse_leave_row(row: &Row<'_>) -> RepoResult<LeaveRequest> {
    Ok(LeaveRequest {
        id: row_id(row, "id")?,
        employee_id: row_id(row, "employee_id")?,
        leave_type: row_choice(row, "leave_type")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        status: row_choice(row, "status")?,
        approved_by: row_opt_id(row, "approved_by")?,
    })
}

//! Payroll repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `employee_id` holds the `employee` role.
//! - Amounts are persisted as decimal text and never pass through floats.

use crate::model::choice::Role;
use crate::model::payroll::{NewPayroll, Payroll, PayrollId, PayrollPatch};
use crate::model::user::UserId;
use crate::repo::codec::{decimal_to_db, id_to_db, row_decimal, row_document, row_id};
use crate::repo::guard::{require_user, UserRule};
use crate::repo::{ensure_connection_ready, push_page, with_write_tx, Page, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PAYROLL_SELECT_SQL: &str = "SELECT
    id,
    employee_id,
    period,
    gross_salary,
    deductions,
    net_salary,
    bonuses,
    payslip_file
FROM payrolls";

#[derive(Debug, Clone, Default)]
pub struct PayrollListQuery {
    pub employee_id: Option<UserId>,
    pub period: Option<String>,
    pub page: Page,
}

/// Repository interface for payroll records.
pub trait PayrollRepository {
    fn create_payroll(&self, new: NewPayroll) -> RepoResult<Payroll>;
    fn get_payroll(&self, id: PayrollId) -> RepoResult<Option<Payroll>>;
    fn list_payrolls(&self, query: &PayrollListQuery) -> RepoResult<Vec<Payroll>>;
    fn update_payroll(&self, id: PayrollId, patch: PayrollPatch) -> RepoResult<Payroll>;
    fn delete_payroll(&self, id: PayrollId) -> RepoResult<()>;
}

/// SQLite-backed payroll repository.
pub struct SqlitePayrollRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePayrollRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "payrolls"])?;
        Ok(Self { conn })
    }
}

impl PayrollRepository for SqlitePayrollRepository<'_> {
    fn create_payroll(&self, new: NewPayroll) -> RepoResult<Payroll> {
        with_write_tx(self.conn, |conn| {
            let payroll = new.build()?;
            payroll.validate()?;
            check_employee(conn, payroll.employee_id)?;

            conn.execute(
                "INSERT INTO payrolls (
                    id,
                    employee_id,
                    period,
                    gross_salary,
                    deductions,
                    net_salary,
                    bonuses,
                    payslip_file
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    id_to_db(payroll.id),
                    id_to_db(payroll.employee_id),
                    payroll.period.as_str(),
                    decimal_to_db(payroll.gross_salary),
                    decimal_to_db(payroll.deductions),
                    decimal_to_db(payroll.net_salary),
                    decimal_to_db(payroll.bonuses),
                    payroll.payslip_file.as_str(),
                ],
            )?;
            Ok(payroll)
        })
    }

    fn get_payroll(&self, id: PayrollId) -> RepoResult<Option<Payroll>> {
        get_payroll_in(self.conn, id)
    }

    fn list_payrolls(&self, query: &PayrollListQuery) -> RepoResult<Vec<Payroll>> {
        let mut sql = format!("{PAYROLL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(employee_id) = query.employee_id {
            sql.push_str(" AND employee_id = ?");
            bind_values.push(Value::Text(id_to_db(employee_id)));
        }
        if let Some(period) = query.period.as_deref() {
            sql.push_str(" AND period = ?");
            bind_values.push(Value::Text(period.to_string()));
        }

        sql.push_str(" ORDER BY period DESC, id ASC");
        push_page(&mut sql, &mut bind_values, query.page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut payrolls = Vec::new();
        while let Some(row) = rows.next()? {
            payrolls.push(parse_payroll_row(row)?);
        }
        Ok(payrolls)
    }

    fn update_payroll(&self, id: PayrollId, patch: PayrollPatch) -> RepoResult<Payroll> {
        with_write_tx(self.conn, |conn| {
            let mut payroll =
                get_payroll_in(conn, id)?.ok_or_else(|| RepoError::not_found("payroll", id))?;
            payroll.apply(patch)?;
            payroll.validate()?;

            conn.execute(
                "UPDATE payrolls
                 SET
                    period = ?1,
                    gross_salary = ?2,
                    deductions = ?3,
                    net_salary = ?4,
                    bonuses = ?5,
                    payslip_file = ?6
                 WHERE id = ?7;",
                params![
                    payroll.period.as_str(),
                    decimal_to_db(payroll.gross_salary),
                    decimal_to_db(payroll.deductions),
                    decimal_to_db(payroll.net_salary),
                    decimal_to_db(payroll.bonuses),
                    payroll.payslip_file.as_str(),
                    id_to_db(payroll.id),
                ],
            )?;
            Ok(payroll)
        })
    }

    fn delete_payroll(&self, id: PayrollId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM payrolls WHERE id = ?1;", [id_to_db(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found("payroll", id));
        }
        Ok(())
    }
}

fn check_employee(conn: &Connection, employee_id: UserId) -> RepoResult<()> {
    require_user(
        conn,
        "employee_id",
        employee_id,
        UserRule::default().with_role(Role::Employee),
    )?;
    Ok(())
}

fn get_payroll_in(conn: &Connection, id: PayrollId) -> RepoResult<Option<Payroll>> {
    let mut stmt = conn.prepare(&format!("{PAYROLL_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id_to_db(id)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_payroll_row(row)?));
    }
    Ok(None)
}

fn parse_payroll_row(row: &Row<'_>) -> RepoResult<Payroll> {
    Ok(Payroll {
        id: row_id(row, "id")?,
        employee_id: row_id(row, "employee_id")?,
        period: row.get("period")?,
        gross_salary: row_decimal(row, "gross_salary")?,
        deductions: row_decimal(row, "deductions")?,
        net_salary: row_decimal(row, "net_salary")?,
        bonuses: row_decimal(row, "bonuses")?,
        payslip_file: row_document(row, "payslip_file")?,
    })
}

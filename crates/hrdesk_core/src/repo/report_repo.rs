//! Report repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `generated_by` is an `hr` user of the report's company.
//! - `date` is stamped with the current UTC day on insert and never
//!   rewritten.

use crate::model::choice::{ReportType, Role};
use crate::model::company::CompanyId;
use crate::model::report::{NewReport, Report, ReportId, ReportPatch};
use crate::repo::codec::{id_to_db, json_to_db, row_choice, row_id, row_json};
use crate::repo::guard::{require_company, require_user, UserRule};
use crate::repo::{ensure_connection_ready, push_page, with_write_tx, Page, RepoError, RepoResult};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const REPORT_SELECT_SQL: &str = "SELECT
    id,
    company_id,
    report_type,
    data,
    generated_by,
    report_date
FROM reports";

#[derive(Debug, Clone, Default)]
pub struct ReportListQuery {
    pub company_id: Option<CompanyId>,
    pub report_type: Option<ReportType>,
    pub page: Page,
}

/// Repository interface for generated reports.
pub trait ReportRepository {
    fn create_report(&self, new: NewReport) -> RepoResult<Report>;
    fn get_report(&self, id: ReportId) -> RepoResult<Option<Report>>;
    fn list_reports(&self, query: &ReportListQuery) -> RepoResult<Vec<Report>>;
    fn update_report(&self, id: ReportId, patch: ReportPatch) -> RepoResult<Report>;
    fn delete_report(&self, id: ReportId) -> RepoResult<()>;
}

/// SQLite-backed report repository.
pub struct SqliteReportRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReportRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["companies", "users", "reports"])?;
        Ok(Self { conn })
    }
}

impl ReportRepository for SqliteReportRepository<'_> {
    fn create_report(&self, new: NewReport) -> RepoResult<Report> {
        with_write_tx(self.conn, |conn| {
            let report = new.build(Utc::now().date_naive());
            report.validate()?;
            require_company(conn, "company_id", report.company_id)?;
            require_user(
                conn,
                "generated_by",
                report.generated_by,
                UserRule::in_company(report.company_id).with_role(Role::Hr),
            )?;

            conn.execute(
                "INSERT INTO reports (
                    id,
                    company_id,
                    report_type,
                    data,
                    generated_by,
                    report_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    id_to_db(report.id),
                    id_to_db(report.company_id),
                    report.report_type.as_str(),
                    json_to_db("data", &report.data)?,
                    id_to_db(report.generated_by),
                    report.date,
                ],
            )?;
            Ok(report)
        })
    }

    fn get_report(&self, id: ReportId) -> RepoResult<Option<Report>> {
        get_report_in(self.conn, id)
    }

    fn list_reports(&self, query: &ReportListQuery) -> RepoResult<Vec<Report>> {
        let mut sql = format!("{REPORT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(company_id) = query.company_id {
            sql.push_str(" AND company_id = ?");
            bind_values.push(Value::Text(id_to_db(company_id)));
        }
        if let Some(report_type) = query.report_type {
            sql.push_str(" AND report_type = ?");
            bind_values.push(Value::Text(report_type.as_str().to_string()));
        }

        sql.push_str(" ORDER BY report_date DESC, id ASC");
        push_page(&mut sql, &mut bind_values, query.page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut reports = Vec::new();
        while let Some(row) = rows.next()? {
            reports.push(parse_report_row(row)?);
        }
        Ok(reports)
    }

    fn update_report(&self, id: ReportId, patch: ReportPatch) -> RepoResult<Report> {
        with_write_tx(self.conn, |conn| {
            let mut report =
                get_report_in(conn, id)?.ok_or_else(|| RepoError::not_found("report", id))?;
            report.apply(patch);
            report.validate()?;

            conn.execute(
                "UPDATE reports
                 SET
                    report_type = ?1,
                    data = ?2
                 WHERE id = ?3;",
                params![
                    report.report_type.as_str(),
                    json_to_db("data", &report.data)?,
                    id_to_db(report.id),
                ],
            )?;
            Ok(report)
        })
    }

    fn delete_report(&self, id: ReportId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reports WHERE id = ?1;", [id_to_db(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found("report", id));
        }
        Ok(())
    }
}

fn get_report_in(conn: &Connection, id: ReportId) -> RepoResult<Option<Report>> {
    let mut stmt = conn.prepare(&format!("{REPORT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id_to_db(id)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_report_row(row)?));
    }
    Ok(None)
}

fn parse_report_row(row: &Row<'_>) -> RepoResult<Report> {
    Ok(Report {
        id: row_id(row, "id")?,
        company_id: row_id(row, "company_id")?,
        report_type: row_choice(row, "report_type")?,
        data: row_json(row, "data")?,
        generated_by: row_id(row, "generated_by")?,
        date: row.get("report_date")?,
    })
}

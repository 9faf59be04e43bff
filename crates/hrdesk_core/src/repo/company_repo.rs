//! Company repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `companies` plus lookups by unique name/domain.
//!
//! # Invariants
//! - `name` and `domain` are unique; duplicates fail with
//!   `RepoError::ConstraintViolation`.
//! - Deleting a company cascades to every row it owns.

use crate::model::company::{Company, CompanyId, CompanyPatch, NewCompany};
use crate::model::now_millis;
use crate::repo::codec::{
    bool_to_db, id_to_db, opt_document_to_db, row_bool, row_choice, row_id, row_opt_document,
    row_timestamp, timestamp_to_db,
};
use crate::repo::{ensure_connection_ready, push_page, with_write_tx, Page, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const COMPANY_SELECT_SQL: &str = "SELECT
    id,
    name,
    domain,
    created_at,
    is_active,
    verification_document,
    verification_status
FROM companies";

/// Query options for listing companies.
#[derive(Debug, Clone, Default)]
pub struct CompanyListQuery {
    /// `Some(true)` returns active companies only.
    pub is_active: Option<bool>,
    pub page: Page,
}

/// Repository interface for company CRUD operations.
pub trait CompanyRepository {
    fn create_company(&self, new: NewCompany) -> RepoResult<Company>;
    fn get_company(&self, id: CompanyId) -> RepoResult<Option<Company>>;
    fn find_company_by_name(&self, name: &str) -> RepoResult<Option<Company>>;
    fn find_company_by_domain(&self, domain: &str) -> RepoResult<Option<Company>>;
    fn list_companies(&self, query: &CompanyListQuery) -> RepoResult<Vec<Company>>;
    fn update_company(&self, id: CompanyId, patch: CompanyPatch) -> RepoResult<Company>;
    fn delete_company(&self, id: CompanyId) -> RepoResult<()>;
}

/// SQLite-backed company repository.
pub struct SqliteCompanyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompanyRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["companies"])?;
        Ok(Self { conn })
    }
}

impl CompanyRepository for SqliteCompanyRepository<'_> {
    fn create_company(&self, new: NewCompany) -> RepoResult<Company> {
        let company = new.build(now_millis());
        company.validate()?;

        self.conn.execute(
            "INSERT INTO companies (
                id,
                name,
                domain,
                created_at,
                is_active,
                verification_document,
                verification_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id_to_db(company.id),
                company.name.as_str(),
                company.domain.as_str(),
                timestamp_to_db(company.created_at),
                bool_to_db(company.is_active),
                opt_document_to_db(company.verification_document.as_ref()),
                company.verification_status.as_str(),
            ],
        )?;

        Ok(company)
    }

    fn get_company(&self, id: CompanyId) -> RepoResult<Option<Company>> {
        get_company_in(self.conn, id)
    }

    fn find_company_by_name(&self, name: &str) -> RepoResult<Option<Company>> {
        find_company_where(self.conn, "name", name)
    }

    fn find_company_by_domain(&self, domain: &str) -> RepoResult<Option<Company>> {
        find_company_where(self.conn, "domain", domain)
    }

    fn list_companies(&self, query: &CompanyListQuery) -> RepoResult<Vec<Company>> {
        let mut sql = format!("{COMPANY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(is_active) = query.is_active {
            sql.push_str(" AND is_active = ?");
            bind_values.push(Value::Integer(bool_to_db(is_active)));
        }

        sql.push_str(" ORDER BY name ASC, id ASC");
        push_page(&mut sql, &mut bind_values, query.page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut companies = Vec::new();
        while let Some(row) = rows.next()? {
            companies.push(parse_company_row(row)?);
        }
        Ok(companies)
    }

    fn update_company(&self, id: CompanyId, patch: CompanyPatch) -> RepoResult<Company> {
        with_write_tx(self.conn, |conn| {
            let mut company =
                get_company_in(conn, id)?.ok_or_else(|| RepoError::not_found("company", id))?;
            company.apply(patch);
            company.validate()?;

            conn.execute(
                "UPDATE companies
                 SET
                    name = ?1,
                    domain = ?2,
                    is_active = ?3,
                    verification_document = ?4,
                    verification_status = ?5
                 WHERE id = ?6;",
                params![
                    company.name.as_str(),
                    company.domain.as_str(),
                    bool_to_db(company.is_active),
                    opt_document_to_db(company.verification_document.as_ref()),
                    company.verification_status.as_str(),
                    id_to_db(company.id),
                ],
            )?;
            Ok(company)
        })
    }

    fn delete_company(&self, id: CompanyId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM companies WHERE id = ?1;", [id_to_db(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found("company", id));
        }
        Ok(())
    }
}

fn get_company_in(conn: &Connection, id: CompanyId) -> RepoResult<Option<Company>> {
    find_company_where(conn, "id", &id_to_db(id))
}

fn find_company_where(
    conn: &Connection,
    column: &'static str,
    value: &str,
) -> RepoResult<Option<Company>> {
    let mut stmt = conn.prepare(&format!("{COMPANY_SELECT_SQL} WHERE {column} = ?1;"))?;
    let mut rows = stmt.query([value])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_company_row(row)?));
    }
    Ok(None)
}

fn parse_company_row(row: &Row<'_>) -> RepoResult<Company> {
    Ok(Company {
        id: row_id(row, "id")?,
        name: row.get("name")?,
        domain: row.get("domain")?,
        created_at: row_timestamp(row, "created_at")?,
        is_active: row_bool(row, "is_active")?,
        verification_document: row_opt_document(row, "verification_document")?,
        verification_status: row_choice(row, "verification_status")?,
    })
}

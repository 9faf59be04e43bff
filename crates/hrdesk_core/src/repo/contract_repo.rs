//! Contract repository contracts and SQLite implementation.

use crate::model::contract::{Contract, ContractId, ContractPatch, NewContract};
use crate::model::payload::PayloadRecord;
use crate::model::user::UserId;
use crate::repo::codec::{id_to_db, json_to_db, row_choice, row_document, row_id, row_json};
use crate::repo::guard::{require_user, UserRule};
use crate::repo::{ensure_connection_ready, push_page, with_write_tx, Page, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const CONTRACT_SELECT_SQL: &str = "SELECT
    id,
    employee_id,
    contract_type,
    start_date,
    end_date,
    document_file,
    amendments
FROM contracts";

#[derive(Debug, Clone, Default)]
pub struct ContractListQuery {
    pub employee_id: Option<UserId>,
    pub page: Page,
}

/// Repository interface for employment contracts.
pub trait ContractRepository {
    fn create_contract(&self, new: NewContract) -> RepoResult<Contract>;
    fn get_contract(&self, id: ContractId) -> RepoResult<Option<Contract>>;
    fn list_contracts(&self, query: &ContractListQuery) -> RepoResult<Vec<Contract>>;
    fn update_contract(&self, id: ContractId, patch: ContractPatch) -> RepoResult<Contract>;
    /// Appends one entry to the amendment history.
    fn append_amendment(&self, id: ContractId, amendment: PayloadRecord) -> RepoResult<Contract>;
    fn delete_contract(&self, id: ContractId) -> RepoResult<()>;
}

/// SQLite-backed contract repository.
pub struct SqliteContractRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContractRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "contracts"])?;
        Ok(Self { conn })
    }
}

impl ContractRepository for SqliteContractRepository<'_> {
    fn create_contract(&self, new: NewContract) -> RepoResult<Contract> {
        with_write_tx(self.conn, |conn| {
            let contract = new.build();
            contract.validate()?;
            require_user(conn, "employee_id", contract.employee_id, UserRule::default())?;

            conn.execute(
                "INSERT INTO contracts (
                    id,
                    employee_id,
                    contract_type,
                    start_date,
                    end_date,
                    document_file,
                    amendments
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    id_to_db(contract.id),
                    id_to_db(contract.employee_id),
                    contract.contract_type.as_str(),
                    contract.start_date,
                    contract.end_date,
                    contract.document_file.as_str(),
                    json_to_db("amendments", &contract.amendments)?,
                ],
            )?;
            Ok(contract)
        })
    }

    fn get_contract(&self, id: ContractId) -> RepoResult<Option<Contract>> {
        get_contract_in(self.conn, id)
    }

    fn list_contracts(&self, query: &ContractListQuery) -> RepoResult<Vec<Contract>> {
        let mut sql = format!("{CONTRACT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(employee_id) = query.employee_id {
            sql.push_str(" AND employee_id = ?");
            bind_values.push(Value::Text(id_to_db(employee_id)));
        }

        sql.push_str(" ORDER BY start_date ASC, id ASC");
        push_page(&mut sql, &mut bind_values, query.page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut contracts = Vec::new();
        while let Some(row) = rows.next()? {
            contracts.push(parse_contract_row(row)?);
        }
        Ok(contracts)
    }

    fn update_contract(&self, id: ContractId, patch: ContractPatch) -> RepoResult<Contract> {
        with_write_tx(self.conn, |conn| {
            let mut contract = load_contract(conn, id)?;
            contract.apply(patch);
            contract.validate()?;
            store_contract(conn, &contract)?;
            Ok(contract)
        })
    }

    fn append_amendment(&self, id: ContractId, amendment: PayloadRecord) -> RepoResult<Contract> {
        with_write_tx(self.conn, |conn| {
            let mut contract = load_contract(conn, id)?;
            contract.push_amendment(amendment);
            contract.validate()?;
            store_contract(conn, &contract)?;
            Ok(contract)
        })
    }

    fn delete_contract(&self, id: ContractId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM contracts WHERE id = ?1;", [id_to_db(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found("contract", id));
        }
        Ok(())
    }
}

fn load_contract(conn: &Connection, id: ContractId) -> RepoResult<Contract> {
    get_contract_in(conn, id)?.ok_or_else(|| RepoError::not_found("contract", id))
}

fn store_contract(conn: &Connection, contract: &Contract) -> RepoResult<()> {
    conn.execute(
        "UPDATE contracts
         SET
            contract_type = ?1,
            start_date = ?2,
            end_date = ?3,
            document_file = ?4,
            amendments = ?5
         WHERE id = ?6;",
        params![
            contract.contract_type.as_str(),
            contract.start_date,
            contract.end_date,
            contract.document_file.as_str(),
            json_to_db("amendments", &contract.amendments)?,
            id_to_db(contract.id),
        ],
    )?;
    Ok(())
}

fn get_contract_in(conn: &Connection, id: ContractId) -> RepoResult<Option<Contract>> {
    let mut stmt = conn.prepare(&format!("{CONTRACT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id_to_db(id)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_contract_row(row)?));
    }
    Ok(None)
}

fn parse_contract_row(row: &Row<'_>) -> RepoResult<Contract> {
    Ok(Contract {
        id: row_id(row, "id")?,
        employee_id: row_id(row, "employee_id")?,
        contract_type: row_choice(row, "contract_type")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        document_file: row_document(row, "document_file")?,
        amendments: row_json(row, "amendments")?,
    })
}

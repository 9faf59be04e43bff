#![allow(dead_code)]

use chrono::NaiveDate;
use hrdesk_core::repo::company_repo::{CompanyRepository, SqliteCompanyRepository};
use hrdesk_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use hrdesk_core::{Company, DocumentRef, NewCompany, NewUser, Role, User};
use rusqlite::Connection;

pub fn company(conn: &Connection, name: &str) -> Company {
    let repo = SqliteCompanyRepository::try_new(conn).unwrap();
    let domain = format!("{}.example", name.to_ascii_lowercase());
    repo.create_company(NewCompany::new(name, domain)).unwrap()
}

pub fn user(conn: &Connection, company: &Company, username: &str, role: Role) -> User {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    repo.create_user(NewUser::new(company.id, username, role))
        .unwrap()
}

pub fn hr(conn: &Connection, company: &Company, username: &str) -> User {
    user(conn, company, username, Role::Hr)
}

pub fn employee(conn: &Connection, company: &Company, username: &str) -> User {
    user(conn, company, username, Role::Employee)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn doc(value: &str) -> DocumentRef {
    DocumentRef::new(value).unwrap()
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

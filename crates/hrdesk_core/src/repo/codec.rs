//! Column encoders/decoders shared by SQLite repositories.
//!
//! # Invariants
//! - Ids are stored as hyphenated UUID text.
//! - Timestamps are stored as UTC epoch milliseconds.
//! - Decoding failures surface as `RepoError::InvalidData` naming the column.

use crate::model::document::DocumentRef;
use crate::model::validation::ValidationError;
use crate::repo::{RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

pub(crate) fn id_to_db(id: Uuid) -> String {
    id.to_string()
}

pub(crate) fn opt_id_to_db(id: Option<Uuid>) -> Option<String> {
    id.map(id_to_db)
}

pub(crate) fn row_id(row: &Row<'_>, column: &'static str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    parse_id(column, &text)
}

pub(crate) fn row_opt_id(row: &Row<'_>, column: &'static str) -> RepoResult<Option<Uuid>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => Ok(Some(parse_id(column, &text)?)),
        None => Ok(None),
    }
}

fn parse_id(column: &'static str, value: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn timestamp_to_db(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn opt_timestamp_to_db(value: Option<DateTime<Utc>>) -> Option<i64> {
    value.map(timestamp_to_db)
}

pub(crate) fn row_timestamp(row: &Row<'_>, column: &'static str) -> RepoResult<DateTime<Utc>> {
    let millis: i64 = row.get(column)?;
    parse_timestamp(column, millis)
}

pub(crate) fn row_opt_timestamp(
    row: &Row<'_>,
    column: &'static str,
) -> RepoResult<Option<DateTime<Utc>>> {
    match row.get::<_, Option<i64>>(column)? {
        Some(millis) => Ok(Some(parse_timestamp(column, millis)?)),
        None => Ok(None),
    }
}

fn parse_timestamp(column: &'static str, millis: i64) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        RepoError::InvalidData(format!("timestamp `{millis}` out of range in {column}"))
    })
}

pub(crate) fn bool_to_db(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn row_bool(row: &Row<'_>, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Decodes a choice enum from its storage code.
pub(crate) fn row_choice<T>(row: &Row<'_>, column: &'static str) -> RepoResult<T>
where
    T: FromStr<Err = ValidationError>,
{
    let code: String = row.get(column)?;
    code.parse::<T>().map_err(|_| {
        RepoError::InvalidData(format!("invalid choice value `{code}` in {column}"))
    })
}

pub(crate) fn decimal_to_db(value: Decimal) -> String {
    value.to_string()
}

pub(crate) fn row_decimal(row: &Row<'_>, column: &'static str) -> RepoResult<Decimal> {
    let text: String = row.get(column)?;
    Decimal::from_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid decimal value `{text}` in {column}"))
    })
}

pub(crate) fn row_document(row: &Row<'_>, column: &'static str) -> RepoResult<DocumentRef> {
    let text: String = row.get(column)?;
    DocumentRef::new(text)
        .map_err(|err| RepoError::InvalidData(format!("invalid document in {column}: {err}")))
}

pub(crate) fn row_opt_document(
    row: &Row<'_>,
    column: &'static str,
) -> RepoResult<Option<DocumentRef>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => Ok(Some(DocumentRef::new(text).map_err(|err| {
            RepoError::InvalidData(format!("invalid document in {column}: {err}"))
        })?)),
        None => Ok(None),
    }
}

pub(crate) fn opt_document_to_db(value: Option<&DocumentRef>) -> Option<&str> {
    value.map(DocumentRef::as_str)
}

pub(crate) fn json_to_db<T: Serialize + ?Sized>(column: &'static str, value: &T) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode {column}: {err}")))
}

pub(crate) fn row_json<T: DeserializeOwned>(row: &Row<'_>, column: &'static str) -> RepoResult<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text)
        .map_err(|err| RepoError::InvalidData(format!("invalid json in {column}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{parse_timestamp, timestamp_to_db};
    use crate::model::now_millis;

    #[test]
    fn timestamps_survive_millisecond_storage() {
        let now = now_millis();
        let decoded = parse_timestamp("created_at", timestamp_to_db(now)).unwrap();
        assert_eq!(decoded, now);
    }
}

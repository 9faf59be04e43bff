//! Semi-structured payloads carried by onboarding, contract and report rows.
//!
//! # Responsibility
//! - Give caller-defined nested data an explicit, typed shape.
//! - Keep the JSON wire form identical to plain JSON values.
//!
//! # Invariants
//! - A `StructuredPayload` is an ordered sequence; order is preserved on
//!   storage round-trips.
//! - Record keys are unique strings.
//! - Floats are finite; JSON has no encoding for NaN or infinity.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One key/value change record.
pub type PayloadRecord = BTreeMap<String, PayloadValue>;

/// Ordered sequence of records, e.g. contract amendment history.
pub type StructuredPayload = Vec<PayloadRecord>;

/// Nested value allowed inside structured payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<PayloadValue>),
    Map(PayloadRecord),
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl PayloadValue {
    fn is_finite(&self) -> bool {
        match self {
            Self::Float(value) => value.is_finite(),
            Self::List(values) => values.iter().all(Self::is_finite),
            Self::Map(record) => record.values().all(Self::is_finite),
            _ => true,
        }
    }
}

/// Rejects payloads that would not survive a JSON round-trip.
pub fn validate_payload(
    field: &'static str,
    payload: &[PayloadRecord],
) -> Result<(), ValidationError> {
    let finite = payload
        .iter()
        .all(|record| record.values().all(PayloadValue::is_finite));
    if !finite {
        return Err(ValidationError::NonFiniteNumber { field });
    }
    Ok(())
}

/// Builds one record from `(key, value)` pairs.
pub fn record<K, V, I>(entries: I) -> PayloadRecord
where
    K: Into<String>,
    V: Into<PayloadValue>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// One onboarding checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingStep {
    pub step: String,
    pub completed: bool,
}

impl OnboardingStep {
    /// Creates an open (not completed) step.
    pub fn open(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            completed: false,
        }
    }
}

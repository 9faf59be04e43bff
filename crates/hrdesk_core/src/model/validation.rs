//! Field-level validation shared by all record types.
//!
//! # Responsibility
//! - Define the `ValidationError` taxonomy for malformed field values.
//! - Provide reusable checks for text length, email, money and date ranges.
//!
//! # Invariants
//! - Validation is pure: no storage access happens here.
//! - Monetary values follow fixed precision (10 digits, 2 decimal places).

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// Maximum total digits stored for monetary fields.
pub const MONEY_MAX_DIGITS: u32 = 10;
/// Decimal places stored for monetary fields.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

const EMAIL_MAX_CHARS: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("valid email regex")
});

/// Field validation failure raised before any storage write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{field}` cannot be empty")]
    EmptyField { field: &'static str },
    #[error("`{field}` exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("invalid value `{value}` for `{field}`; expected one of {expected:?}")]
    InvalidChoice {
        field: &'static str,
        value: String,
        expected: &'static [&'static str],
    },
    #[error("invalid email address in `{field}`")]
    InvalidEmail { field: &'static str },
    #[error("`{field}` must fit 10 digits with 2 decimal places, got {value}")]
    MoneyPrecision { field: &'static str, value: Decimal },
    #[error("`{end_field}` ({end}) must be >= `{start_field}` ({start})")]
    ReversedDateRange {
        start_field: &'static str,
        start: NaiveDate,
        end_field: &'static str,
        end: NaiveDate,
    },
    #[error("net_salary {actual} does not equal gross - deductions + bonuses = {expected}")]
    NetSalaryMismatch { expected: Decimal, actual: Decimal },
    #[error("`{field}` must not reference the record itself")]
    SelfReference { field: &'static str },
    #[error("onboarding requires at least one step")]
    NoOnboardingSteps,
    #[error("`{field}` contains a non-finite number")]
    NonFiniteNumber { field: &'static str },
}

/// Checks that `value` is non-blank and at most `max` characters.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    check_length(field, value, max)
}

/// Checks only the length bound; blank values are allowed.
pub fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Checks that `value` looks like a deliverable email address.
pub fn validate_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    check_length(field, value, EMAIL_MAX_CHARS)?;
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::InvalidEmail { field });
    }
    Ok(())
}

/// Checks fixed-precision bounds for one monetary value.
///
/// Trailing zeros do not count against the decimal places.
pub fn validate_money(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    let normalized = value.normalize();
    let integer_limit = Decimal::from(10_i64.pow(MONEY_MAX_DIGITS - MONEY_DECIMAL_PLACES));
    if normalized.scale() > MONEY_DECIMAL_PLACES || normalized.abs().trunc() >= integer_limit {
        return Err(ValidationError::MoneyPrecision { field, value });
    }
    Ok(())
}

/// Checks `end >= start`.
pub fn validate_date_range(
    start_field: &'static str,
    start: NaiveDate,
    end_field: &'static str,
    end: NaiveDate,
) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::ReversedDateRange {
            start_field,
            start,
            end_field,
            end,
        });
    }
    Ok(())
}

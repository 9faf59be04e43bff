//! Domain records for the HR schema.
//!
//! # Responsibility
//! - Define one record type per entity plus its create input and patch.
//! - Keep field validation next to the data it guards.
//!
//! # Invariants
//! - Every record is identified by a random UUID assigned at creation.
//! - Timestamps are UTC with millisecond precision, matching storage.
//! - Every entity except `Company` is owned by exactly one company.

pub mod choice;
pub mod company;
pub mod contract;
pub mod document;
pub mod invitation;
pub mod leave;
pub mod onboarding;
pub mod payload;
pub mod payroll;
pub mod report;
pub mod task;
pub mod user;
pub mod validation;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// Current UTC time truncated to storage precision.
pub fn now_millis() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

/// Truncates a timestamp to whole milliseconds.
pub fn truncate_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    value
        .duration_trunc(TimeDelta::milliseconds(1))
        .unwrap_or(value)
}

//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own the workflow rules the schema alone cannot express (invitation
//!   redemption, onboarding progress, leave decisions).
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Every successful write emits one `module=service` log event carrying
//!   ids only.

pub mod company_service;
pub mod invitation_service;
pub mod leave_service;
pub mod payroll_service;
pub mod task_service;

use crate::model::choice::LeaveStatus;
use crate::model::invitation::InvitationId;
use crate::model::leave::LeaveRequestId;
use crate::repo::RepoError;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Workflow errors raised above the repository layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no invitation matches the given token")]
    InvitationNotFound,
    #[error("invitation {0} has already been used")]
    InvitationUsed(InvitationId),
    #[error("invitation {id} expired at {expires_at}")]
    InvitationExpired {
        id: InvitationId,
        expires_at: DateTime<Utc>,
    },
    #[error("onboarding step index {index} out of range for {len} steps")]
    StepOutOfRange { index: usize, len: usize },
    #[error("leave request {id} was already {status}")]
    LeaveAlreadyDecided {
        id: LeaveRequestId,
        status: LeaveStatus,
    },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

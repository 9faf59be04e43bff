//! Signup invitation record.
//!
//! # Invariants
//! - `token` is globally unique.
//! - `is_used` goes from `false` to `true` once and never back.
//! - `expires_at` defaults to the row's own `created_at` plus the TTL.

use crate::model::company::CompanyId;
use crate::model::truncate_millis;
use crate::model::user::UserId;
use crate::model::validation::{require_text, validate_email, ValidationError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type InvitationId = Uuid;

pub const INVITATION_TOKEN_MAX_CHARS: usize = 64;
pub const DEFAULT_INVITATION_TTL_DAYS: i64 = 7;

/// Default validity window for a new invitation.
pub fn default_invitation_ttl() -> TimeDelta {
    TimeDelta::days(DEFAULT_INVITATION_TTL_DAYS)
}

/// A pending signup grant issued by an HR user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub company_id: CompanyId,
    pub invited_email: String,
    /// Issuer; must hold the `hr` role in the same company.
    pub invited_by: UserId,
    pub token: String,
    pub is_used: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Create input for `Invitation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitation {
    pub company_id: CompanyId,
    pub invited_email: String,
    pub invited_by: UserId,
    pub token: String,
    /// Explicit expiry; `None` means `created_at + ttl`.
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewInvitation {
    pub fn new(
        company_id: CompanyId,
        invited_email: impl Into<String>,
        invited_by: UserId,
        token: impl Into<String>,
    ) -> Self {
        Self {
            company_id,
            invited_email: invited_email.into(),
            invited_by,
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn build(self, now: DateTime<Utc>, ttl: TimeDelta) -> Invitation {
        let expires_at = self.expires_at.map(truncate_millis).unwrap_or(now + ttl);
        Invitation {
            id: Uuid::new_v4(),
            company_id: self.company_id,
            invited_email: self.invited_email,
            invited_by: self.invited_by,
            token: self.token,
            is_used: false,
            expires_at,
            created_at: now,
        }
    }
}

/// Partial update for `Invitation`.
///
/// `is_used` is not patchable; redemption is the only way to set it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvitationPatch {
    pub invited_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email("invited_email", &self.invited_email)?;
        require_text("token", &self.token, INVITATION_TOKEN_MAX_CHARS)?;
        Ok(())
    }

    pub fn apply(&mut self, patch: InvitationPatch) {
        if let Some(email) = patch.invited_email {
            self.invited_email = email;
        }
        if let Some(expires_at) = patch.expires_at {
            self.expires_at = truncate_millis(expires_at);
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the invitation can still be exchanged for an account.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_expired_at(now)
    }
}

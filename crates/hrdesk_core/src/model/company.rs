//! Company (tenant) record.

use crate::model::choice::VerificationStatus;
use crate::model::document::DocumentRef;
use crate::model::validation::{require_text, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CompanyId = Uuid;

pub const COMPANY_NAME_MAX_CHARS: usize = 255;
pub const COMPANY_DOMAIN_MAX_CHARS: usize = 255;

/// A tenant organization. Owns users, invitations, tasks and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    /// Globally unique.
    pub name: String,
    /// Globally unique, e.g. `acme.com`.
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    /// Proof that the registrant belongs to the company.
    pub verification_document: Option<DocumentRef>,
    pub verification_status: VerificationStatus,
}

/// Create input for `Company`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub domain: String,
    pub verification_document: Option<DocumentRef>,
}

impl NewCompany {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            verification_document: None,
        }
    }

    /// Materializes the record with a fresh id. New companies start
    /// active and pending verification.
    pub fn build(self, now: DateTime<Utc>) -> Company {
        Company {
            id: Uuid::new_v4(),
            name: self.name,
            domain: self.domain,
            created_at: now,
            is_active: true,
            verification_document: self.verification_document,
            verification_status: VerificationStatus::default(),
        }
    }
}

/// Partial update for `Company`. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub is_active: Option<bool>,
    pub verification_document: Option<Option<DocumentRef>>,
    pub verification_status: Option<VerificationStatus>,
}

impl Company {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, COMPANY_NAME_MAX_CHARS)?;
        require_text("domain", &self.domain, COMPANY_DOMAIN_MAX_CHARS)?;
        Ok(())
    }

    pub fn apply(&mut self, patch: CompanyPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(domain) = patch.domain {
            self.domain = domain;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(document) = patch.verification_document {
            self.verification_document = document;
        }
        if let Some(status) = patch.verification_status {
            self.verification_status = status;
        }
    }
}

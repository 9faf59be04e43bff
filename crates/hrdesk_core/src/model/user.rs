//! User account record.
//!
//! # Invariants
//! - A user belongs to exactly one company for its whole lifetime.
//! - `invited_by` is advisory: deleting the inviter nulls it.

use crate::model::choice::Role;
use crate::model::company::CompanyId;
use crate::model::document::DocumentRef;
use crate::model::validation::{check_length, require_text, validate_email, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

pub const USERNAME_MAX_CHARS: usize = 150;
pub const PERSON_NAME_MAX_CHARS: usize = 150;
pub const EMPLOYEE_ID_MAX_CHARS: usize = 50;

/// An account scoped to one company, either HR or employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub company_id: CompanyId,
    /// Globally unique login name.
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    /// Set once the account was confirmed by invitation or document.
    pub is_verified: bool,
    /// Company-issued identifier, free-form.
    pub employee_id: Option<String>,
    pub verification_document: Option<DocumentRef>,
    pub invited_by: Option<UserId>,
    /// Hire date.
    pub date_joined_company: Option<NaiveDate>,
    /// Account creation time.
    pub date_joined: DateTime<Utc>,
}

/// Create input for `User`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub company_id: CompanyId,
    pub username: String,
    pub role: Role,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub employee_id: Option<String>,
    pub verification_document: Option<DocumentRef>,
    pub invited_by: Option<UserId>,
    pub date_joined_company: Option<NaiveDate>,
}

impl NewUser {
    pub fn new(company_id: CompanyId, username: impl Into<String>, role: Role) -> Self {
        Self {
            company_id,
            username: username.into(),
            role,
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            is_verified: false,
            employee_id: None,
            verification_document: None,
            invited_by: None,
            date_joined_company: None,
        }
    }

    pub fn build(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            company_id: self.company_id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            is_active: true,
            is_verified: self.is_verified,
            employee_id: self.employee_id,
            verification_document: self.verification_document,
            invited_by: self.invited_by,
            date_joined_company: self.date_joined_company,
            date_joined: now,
        }
    }
}

/// Partial update for `User`. The owning company cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<Option<String>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    pub employee_id: Option<Option<String>>,
    pub verification_document: Option<Option<DocumentRef>>,
    pub invited_by: Option<Option<UserId>>,
    pub date_joined_company: Option<Option<NaiveDate>>,
}

impl User {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("username", &self.username, USERNAME_MAX_CHARS)?;
        if let Some(email) = self.email.as_deref() {
            validate_email("email", email)?;
        }
        check_length("first_name", &self.first_name, PERSON_NAME_MAX_CHARS)?;
        check_length("last_name", &self.last_name, PERSON_NAME_MAX_CHARS)?;
        if let Some(employee_id) = self.employee_id.as_deref() {
            require_text("employee_id", employee_id, EMPLOYEE_ID_MAX_CHARS)?;
        }
        if self.invited_by == Some(self.id) {
            return Err(ValidationError::SelfReference {
                field: "invited_by",
            });
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(is_verified) = patch.is_verified {
            self.is_verified = is_verified;
        }
        if let Some(employee_id) = patch.employee_id {
            self.employee_id = employee_id;
        }
        if let Some(document) = patch.verification_document {
            self.verification_document = document;
        }
        if let Some(invited_by) = patch.invited_by {
            self.invited_by = invited_by;
        }
        if let Some(hire_date) = patch.date_joined_company {
            self.date_joined_company = hire_date;
        }
    }
}

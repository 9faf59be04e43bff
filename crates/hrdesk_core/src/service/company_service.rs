//! Company use-case service.
//!
//! # Responsibility
//! - Register tenants and drive their verification lifecycle.

use crate::model::choice::VerificationStatus;
use crate::model::company::{Company, CompanyId, CompanyPatch, NewCompany};
use crate::model::document::DocumentRef;
use crate::repo::company_repo::{CompanyListQuery, CompanyRepository};
use crate::service::ServiceResult;
use log::info;

/// Use-case service wrapper for company operations.
pub struct CompanyService<R: CompanyRepository> {
    repo: R,
}

impl<R: CompanyRepository> CompanyService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new tenant in `pending` verification state.
    pub fn register(
        &self,
        name: impl Into<String>,
        domain: impl Into<String>,
        verification_document: Option<DocumentRef>,
    ) -> ServiceResult<Company> {
        let new = NewCompany {
            verification_document,
            ..NewCompany::new(name, domain)
        };
        let company = self.repo.create_company(new)?;
        info!(
            "event=company_register module=service status=ok company_id={}",
            company.id
        );
        Ok(company)
    }

    pub fn approve_verification(&self, id: CompanyId) -> ServiceResult<Company> {
        self.set_verification(id, VerificationStatus::Approved)
    }

    pub fn reject_verification(&self, id: CompanyId) -> ServiceResult<Company> {
        self.set_verification(id, VerificationStatus::Rejected)
    }

    pub fn activate(&self, id: CompanyId) -> ServiceResult<Company> {
        self.set_active(id, true)
    }

    /// Deactivates a tenant. Its data stays in place.
    pub fn deactivate(&self, id: CompanyId) -> ServiceResult<Company> {
        self.set_active(id, false)
    }

    pub fn get(&self, id: CompanyId) -> ServiceResult<Option<Company>> {
        Ok(self.repo.get_company(id)?)
    }

    pub fn list(&self, query: &CompanyListQuery) -> ServiceResult<Vec<Company>> {
        Ok(self.repo.list_companies(query)?)
    }

    /// Deletes a tenant and everything it owns.
    pub fn delete(&self, id: CompanyId) -> ServiceResult<()> {
        self.repo.delete_company(id)?;
        info!("event=company_delete module=service status=ok company_id={id}");
        Ok(())
    }

    fn set_verification(
        &self,
        id: CompanyId,
        status: VerificationStatus,
    ) -> ServiceResult<Company> {
        let company = self.repo.update_company(
            id,
            CompanyPatch {
                verification_status: Some(status),
                ..CompanyPatch::default()
            },
        )?;
        info!(
            "event=company_verification module=service status=ok company_id={id} verification={}",
            status.as_str()
        );
        Ok(company)
    }

    fn set_active(&self, id: CompanyId, is_active: bool) -> ServiceResult<Company> {
        let company = self.repo.update_company(
            id,
            CompanyPatch {
                is_active: Some(is_active),
                ..CompanyPatch::default()
            },
        )?;
        info!("event=company_set_active module=service status=ok company_id={id} is_active={is_active}");
        Ok(company)
    }
}

//! Generated analytics report record.

use crate::model::choice::ReportType;
use crate::model::company::CompanyId;
use crate::model::payload::{validate_payload, StructuredPayload};
use crate::model::user::UserId;
use crate::model::validation::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ReportId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub company_id: CompanyId,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub data: StructuredPayload,
    /// Must be an `hr` user of the same company.
    pub generated_by: UserId,
    /// Set once at creation.
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub company_id: CompanyId,
    pub report_type: ReportType,
    pub data: StructuredPayload,
    pub generated_by: UserId,
}

impl NewReport {
    pub fn new(
        company_id: CompanyId,
        report_type: ReportType,
        data: StructuredPayload,
        generated_by: UserId,
    ) -> Self {
        Self {
            company_id,
            report_type,
            data,
            generated_by,
        }
    }

    pub fn build(self, today: NaiveDate) -> Report {
        Report {
            id: Uuid::new_v4(),
            company_id: self.company_id,
            report_type: self.report_type,
            data: self.data,
            generated_by: self.generated_by,
            date: today,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPatch {
    pub report_type: Option<ReportType>,
    pub data: Option<StructuredPayload>,
}

impl Report {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_payload("data", &self.data)
    }

    pub fn apply(&mut self, patch: ReportPatch) {
        if let Some(report_type) = patch.report_type {
            self.report_type = report_type;
        }
        if let Some(data) = patch.data {
            self.data = data;
        }
    }
}

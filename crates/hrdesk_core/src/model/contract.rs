//! Employment contract record with amendment history.

use crate::model::choice::ContractType;
use crate::model::document::DocumentRef;
use crate::model::payload::{validate_payload, PayloadRecord, StructuredPayload};
use crate::model::user::UserId;
use crate::model::validation::{validate_date_range, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ContractId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub employee_id: UserId,
    #[serde(rename = "type")]
    pub contract_type: ContractType,
    pub start_date: NaiveDate,
    /// `None` for open-ended contracts.
    pub end_date: Option<NaiveDate>,
    pub document_file: DocumentRef,
    /// Change history, oldest first.
    pub amendments: StructuredPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewContract {
    pub employee_id: UserId,
    pub contract_type: ContractType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub document_file: DocumentRef,
    pub amendments: StructuredPayload,
}

impl NewContract {
    pub fn new(
        employee_id: UserId,
        contract_type: ContractType,
        start_date: NaiveDate,
        document_file: DocumentRef,
    ) -> Self {
        Self {
            employee_id,
            contract_type,
            start_date,
            end_date: None,
            document_file,
            amendments: Vec::new(),
        }
    }

    pub fn build(self) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            employee_id: self.employee_id,
            contract_type: self.contract_type,
            start_date: self.start_date,
            end_date: self.end_date,
            document_file: self.document_file,
            amendments: self.amendments,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractPatch {
    pub contract_type: Option<ContractType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub document_file: Option<DocumentRef>,
    pub amendments: Option<StructuredPayload>,
}

impl Contract {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(end_date) = self.end_date {
            validate_date_range("start_date", self.start_date, "end_date", end_date)?;
        }
        validate_payload("amendments", &self.amendments)
    }

    pub fn apply(&mut self, patch: ContractPatch) {
        if let Some(contract_type) = patch.contract_type {
            self.contract_type = contract_type;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(document) = patch.document_file {
            self.document_file = document;
        }
        if let Some(amendments) = patch.amendments {
            self.amendments = amendments;
        }
    }

    pub fn push_amendment(&mut self, amendment: PayloadRecord) {
        self.amendments.push(amendment);
    }

    /// Whether the contract covers `day`.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        day >= self.start_date && self.end_date.map_or(true, |end| day <= end)
    }
}

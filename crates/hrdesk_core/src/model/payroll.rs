//! Payroll record for one pay period.
//!
//! # Invariants
//! - Monetary fields are fixed-precision decimals, never floats.
//! - `net_salary == gross_salary - deductions + bonuses`.

use crate::model::document::DocumentRef;
use crate::model::user::UserId;
use crate::model::validation::{require_text, validate_money, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PayrollId = Uuid;

pub const PAYROLL_PERIOD_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payroll {
    pub id: PayrollId,
    pub employee_id: UserId,
    /// Period label, e.g. `2023-10`.
    pub period: String,
    pub gross_salary: Decimal,
    pub deductions: Decimal,
    pub net_salary: Decimal,
    pub bonuses: Decimal,
    pub payslip_file: DocumentRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayroll {
    pub employee_id: UserId,
    pub period: String,
    pub gross_salary: Decimal,
    pub deductions: Decimal,
    pub bonuses: Decimal,
    /// `None` derives the net amount from the other fields.
    pub net_salary: Option<Decimal>,
    pub payslip_file: DocumentRef,
}

impl NewPayroll {
    pub fn new(
        employee_id: UserId,
        period: impl Into<String>,
        gross_salary: Decimal,
        deductions: Decimal,
        payslip_file: DocumentRef,
    ) -> Self {
        Self {
            employee_id,
            period: period.into(),
            gross_salary,
            deductions,
            bonuses: Decimal::ZERO,
            net_salary: None,
            payslip_file,
        }
    }

    /// Fails when an amount is out of range, before any net arithmetic.
    pub fn build(self) -> Result<Payroll, ValidationError> {
        let net_salary = match self.net_salary {
            Some(net) => net,
            None => expected_net_salary(self.gross_salary, self.deductions, self.bonuses)?,
        };
        Ok(Payroll {
            id: Uuid::new_v4(),
            employee_id: self.employee_id,
            period: self.period,
            gross_salary: self.gross_salary,
            deductions: self.deductions,
            net_salary,
            bonuses: self.bonuses,
            payslip_file: self.payslip_file,
        })
    }
}

/// Partial update for `Payroll`.
///
/// When any amount changes and `net_salary` is not given, the net amount
/// is recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayrollPatch {
    pub period: Option<String>,
    pub gross_salary: Option<Decimal>,
    pub deductions: Option<Decimal>,
    pub bonuses: Option<Decimal>,
    pub net_salary: Option<Decimal>,
    pub payslip_file: Option<DocumentRef>,
}

/// `gross - deductions + bonuses`.
///
/// Inputs are bounds-checked first, so the arithmetic cannot overflow.
pub fn expected_net_salary(
    gross: Decimal,
    deductions: Decimal,
    bonuses: Decimal,
) -> Result<Decimal, ValidationError> {
    validate_money("gross_salary", gross)?;
    validate_money("deductions", deductions)?;
    validate_money("bonuses", bonuses)?;
    Ok(gross - deductions + bonuses)
}

impl Payroll {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("period", &self.period, PAYROLL_PERIOD_MAX_CHARS)?;
        let expected = expected_net_salary(self.gross_salary, self.deductions, self.bonuses)?;
        validate_money("net_salary", self.net_salary)?;
        if expected != self.net_salary {
            return Err(ValidationError::NetSalaryMismatch {
                expected,
                actual: self.net_salary,
            });
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: PayrollPatch) -> Result<(), ValidationError> {
        let amounts_changed =
            patch.gross_salary.is_some() || patch.deductions.is_some() || patch.bonuses.is_some();
        if let Some(period) = patch.period {
            self.period = period;
        }
        if let Some(gross) = patch.gross_salary {
            self.gross_salary = gross;
        }
        if let Some(deductions) = patch.deductions {
            self.deductions = deductions;
        }
        if let Some(bonuses) = patch.bonuses {
            self.bonuses = bonuses;
        }
        match patch.net_salary {
            Some(net) => self.net_salary = net,
            None if amounts_changed => {
                self.net_salary =
                    expected_net_salary(self.gross_salary, self.deductions, self.bonuses)?;
            }
            None => {}
        }
        if let Some(payslip) = patch.payslip_file {
            self.payslip_file = payslip;
        }
        Ok(())
    }
}

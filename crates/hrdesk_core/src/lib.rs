//! Core domain logic for the multi-tenant HR desk.
//! This crate is the single source of truth for tenant, role and payroll
//! invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, HrdeskConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::choice::{
    ContractType, LeaveStatus, LeaveType, ReportType, Role, TaskCategory, TaskPriority,
    TaskStatus, VerificationStatus,
};
pub use model::company::{Company, CompanyId, CompanyPatch, NewCompany};
pub use model::contract::{Contract, ContractId, ContractPatch, NewContract};
pub use model::document::DocumentRef;
pub use model::invitation::{Invitation, InvitationId, InvitationPatch, NewInvitation};
pub use model::leave::{LeaveRequest, LeaveRequestId, LeaveRequestPatch, NewLeaveRequest};
pub use model::onboarding::{NewOnboarding, Onboarding, OnboardingId, OnboardingPatch};
pub use model::payload::{OnboardingStep, PayloadRecord, PayloadValue, StructuredPayload};
pub use model::payroll::{NewPayroll, Payroll, PayrollId, PayrollPatch};
pub use model::report::{NewReport, Report, ReportId, ReportPatch};
pub use model::task::{NewTask, Task, TaskId, TaskPatch};
pub use model::user::{NewUser, User, UserId, UserPatch};
pub use model::validation::ValidationError;
pub use repo::{IntegrityReason, Page, RepoError, RepoResult};
pub use service::{ServiceError, ServiceResult};


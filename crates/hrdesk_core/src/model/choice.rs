//! Closed choice enumerations stored as lowercase text codes.
//!
//! # Responsibility
//! - Define every enumerated field of the schema with its storage code.
//! - Parse external text codes into typed values.
//!
//! # Invariants
//! - Storage codes are stable; renaming a variant must keep its code.
//! - Parsing an unknown code yields `ValidationError::InvalidChoice`.

use crate::model::validation::ValidationError;

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident (field = $field:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $code)] $variant, )+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            /// Storage codes in declaration order.
            pub const CODES: &'static [&'static str] = &[$($code),+];

            /// Returns the stable storage code.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($code => Ok($name::$variant),)+
                    other => Err(ValidationError::InvalidChoice {
                        field: $field,
                        value: other.to_string(),
                        expected: $name::CODES,
                    }),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum! {
    /// Review state of a company's signup verification.
    VerificationStatus (field = "verification_status") {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

choice_enum! {
    /// Account role inside one company.
    Role (field = "role") {
        /// HR administrator; may invite, create tasks, approve leave.
        Hr => "hr",
        Employee => "employee",
    }
}

choice_enum! {
    /// Task progress. Transitions are caller-driven.
    TaskStatus (field = "status") {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
    }
}

choice_enum! {
    TaskPriority (field = "priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

choice_enum! {
    TaskCategory (field = "category") {
        Onboarding => "onboarding",
        Evaluation => "evaluation",
        Leave => "leave",
        Other => "other",
    }
}

choice_enum! {
    LeaveType (field = "type") {
        Vacation => "vacation",
        Sick => "sick",
        Other => "other",
    }
}

choice_enum! {
    /// Decision state of a leave request.
    LeaveStatus (field = "status") {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

choice_enum! {
    ContractType (field = "type") {
        Employment => "employment",
        Amendment => "amendment",
    }
}

choice_enum! {
    ReportType (field = "type") {
        Turnover => "turnover",
        Diversity => "diversity",
        Performance => "performance",
    }
}

impl Default for VerificationStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Default for LeaveStatus {
    fn default() -> Self {
        Self::Pending
    }
}

//! Intake rules: dispensation thresholds, guardian precedence, and per-field checks.

pub mod dispensation;
pub mod fields;
pub mod guardian;
pub mod screening;

pub use dispensation::{DispensationAssessment, DispensationReason};
pub use guardian::{FatherContext, GuardianViolation};
pub use screening::{IntakeGuard, ScreenedRegistration};

use chrono::NaiveDate;

/// Rejection raised while screening a submission; the first failing rule wins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a date in YYYY-MM-DD format (found '{value}')")]
    InvalidDate { field: String, value: String },
    #[error("wedding date {date} is in the past")]
    WeddingDateInPast { date: NaiveDate },
    #[error("{field} must be a 24-hour HH:MM time (found '{value}')")]
    InvalidTime { field: String, value: String },
    #[error("dispensation number required because: {reasons}")]
    DispensationRequired { reasons: String },
    #[error("{field} has unsupported value '{value}' (allowed: {allowed})")]
    InvalidChoice {
        field: String,
        value: String,
        allowed: &'static str,
    },
    #[error("{field} is required")]
    Missing { field: String },
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },
    #[error("{field} is malformed: {expected}")]
    Malformed {
        field: String,
        expected: &'static str,
    },
    #[error("groom and bride cannot share the same NIK")]
    SharedPartyIdentity,
    #[error(transparent)]
    Guardian(#[from] GuardianViolation),
}

impl ValidationError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }
}

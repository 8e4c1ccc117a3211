//! Raw registration form as submitted by the applicant.
//!
//! Enumerated fields stay textual here so the screening step can report exactly
//! which value was rejected.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSubmission {
    pub schedule: ScheduleForm,
    pub groom: PersonForm,
    pub bride: PersonForm,
    pub groom_father: ParentForm,
    pub groom_mother: ParentForm,
    pub bride_father: ParentForm,
    pub bride_mother: ParentForm,
    pub guardian: GuardianForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleForm {
    /// `YYYY-MM-DD`
    pub wedding_date: String,
    /// `HH:MM`, 24-hour
    pub wedding_time: String,
    /// `Di KUA` or `Di Luar KUA`
    pub venue: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub dispensation_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonForm {
    pub nik: String,
    pub full_name: String,
    pub birthplace: String,
    pub birthdate: String,
    pub citizenship: String,
    #[serde(default)]
    pub passport_number: Option<String>,
    pub religion: String,
    pub education: String,
    pub occupation: String,
    #[serde(default)]
    pub occupation_description: Option<String>,
    pub marital_status: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

/// Every field except `presence` is only read when the parent is alive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentForm {
    pub presence: String,
    #[serde(default)]
    pub nik: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub citizenship: Option<String>,
    #[serde(default)]
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub occupation_description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianForm {
    pub nik: String,
    pub full_name: String,
    pub relation: String,
    pub life_status: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

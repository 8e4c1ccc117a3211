use chrono::NaiveDate;
use serde::Serialize;

use super::ValidationError;
use crate::workflows::marriage::calendar::{age_in_years, working_days};

pub const MINIMUM_WORKING_DAYS: u32 = 10;
pub const MINIMUM_AGE: i32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DispensationReason {
    ShortNotice { working_days: u32 },
    UnderageGroom { age: i32 },
    UnderageBride { age: i32 },
}

impl DispensationReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShortNotice { .. } => "Pelaksanaan nikah kurang dari 10 hari kerja",
            Self::UnderageGroom { .. } => "Calon suami berumur kurang dari 19 tahun",
            Self::UnderageBride { .. } => "Calon istri berumur kurang dari 19 tahun",
        }
    }
}

/// Lead time and ages measured on the submission date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispensationAssessment {
    pub working_days: u32,
    pub groom_age: i32,
    pub bride_age: i32,
    pub reasons: Vec<DispensationReason>,
}

impl DispensationAssessment {
    pub fn assess(
        submitted_on: NaiveDate,
        wedding_date: NaiveDate,
        groom_birthdate: NaiveDate,
        bride_birthdate: NaiveDate,
    ) -> Self {
        let working_days = working_days(submitted_on, wedding_date);
        let groom_age = age_in_years(groom_birthdate, submitted_on);
        let bride_age = age_in_years(bride_birthdate, submitted_on);

        let mut reasons = Vec::new();
        if working_days < MINIMUM_WORKING_DAYS {
            reasons.push(DispensationReason::ShortNotice { working_days });
        }
        if groom_age < MINIMUM_AGE {
            reasons.push(DispensationReason::UnderageGroom { age: groom_age });
        }
        if bride_age < MINIMUM_AGE {
            reasons.push(DispensationReason::UnderageBride { age: bride_age });
        }

        Self {
            working_days,
            groom_age,
            bride_age,
            reasons,
        }
    }

    pub fn is_required(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn reason_summary(&self) -> String {
        self.reasons
            .iter()
            .map(|reason| reason.label())
            .collect::<Vec<_>>()
            .join(" dan ")
    }

    /// Returns the trimmed number to store, or `None` when no dispensation applies.
    pub fn resolve(&self, supplied: Option<&str>) -> Result<Option<String>, ValidationError> {
        let supplied = supplied.map(str::trim).filter(|value| !value.is_empty());
        match (self.is_required(), supplied) {
            (true, None) => Err(ValidationError::DispensationRequired {
                reasons: self.reason_summary(),
            }),
            (_, number) => Ok(number.map(str::to_string)),
        }
    }
}

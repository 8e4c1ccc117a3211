use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::dispensation::DispensationAssessment;
use super::fields::{
    is_valid_nik, parent_record, parse_citizenship, parse_marital_status, parse_parent_presence,
    person_profile,
};
use super::guardian::{validate_guardian, FatherContext, GuardianCandidate};
use super::ValidationError;
use crate::workflows::marriage::calendar::{parse_clock_time, parse_date};
use crate::workflows::marriage::domain::{
    Guardian, GuardianAttendance, GuardianRelation, LifeStatus, ParentRecord, ParentRole, Party,
    PersonProfile, Venue, VenueKind,
};
use crate::workflows::marriage::forms::RegistrationSubmission;

/// A submission that passed every intake rule, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenedRegistration {
    pub wedding_date: NaiveDate,
    pub wedding_time: NaiveTime,
    pub venue: Venue,
    pub dispensation_number: Option<String>,
    pub dispensation: DispensationAssessment,
    pub groom: PersonProfile,
    pub bride: PersonProfile,
    pub parents: Vec<ParentRecord>,
    pub guardian: Guardian,
}

/// Applies the intake rules in the order the office reports them.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn screen(
        &self,
        submission: &RegistrationSubmission,
        submitted_at: NaiveDateTime,
    ) -> Result<ScreenedRegistration, ValidationError> {
        let today = submitted_at.date();
        let schedule = &submission.schedule;

        let wedding_date = date_field("schedule.wedding_date", &schedule.wedding_date)?;
        if wedding_date < today {
            return Err(ValidationError::WeddingDateInPast { date: wedding_date });
        }
        let wedding_time = parse_clock_time(&schedule.wedding_time).ok_or_else(|| {
            ValidationError::InvalidTime {
                field: "schedule.wedding_time".to_string(),
                value: schedule.wedding_time.clone(),
            }
        })?;

        let groom_birthdate = date_field("groom.birthdate", &submission.groom.birthdate)?;
        let bride_birthdate = date_field("bride.birthdate", &submission.bride.birthdate)?;

        let dispensation =
            DispensationAssessment::assess(today, wedding_date, groom_birthdate, bride_birthdate);
        let dispensation_number = dispensation.resolve(schedule.dispensation_number.as_deref())?;

        let groom_citizenship =
            parse_citizenship("groom.citizenship", &submission.groom.citizenship)?;
        let bride_citizenship =
            parse_citizenship("bride.citizenship", &submission.bride.citizenship)?;
        let groom_marital =
            parse_marital_status("groom.marital_status", &submission.groom.marital_status)?;
        let bride_marital =
            parse_marital_status("bride.marital_status", &submission.bride.marital_status)?;

        let guardian = self.guardian(submission)?;
        let venue = venue(schedule.venue.as_str(), schedule.address.as_deref())?;

        let presences = [
            (
                Party::Groom,
                ParentRole::Father,
                &submission.groom_father,
                "groom_father.presence",
            ),
            (
                Party::Groom,
                ParentRole::Mother,
                &submission.groom_mother,
                "groom_mother.presence",
            ),
            (
                Party::Bride,
                ParentRole::Father,
                &submission.bride_father,
                "bride_father.presence",
            ),
            (
                Party::Bride,
                ParentRole::Mother,
                &submission.bride_mother,
                "bride_mother.presence",
            ),
        ]
        .into_iter()
        .map(|(party, role, form, field)| {
            parse_parent_presence(field, &form.presence).map(|presence| (party, role, form, presence))
        })
        .collect::<Result<Vec<_>, _>>()?;

        if submission.groom.nik.trim() == submission.bride.nik.trim() {
            return Err(ValidationError::SharedPartyIdentity);
        }
        let groom = person_profile(
            Party::Groom,
            &submission.groom,
            groom_birthdate,
            groom_citizenship,
            groom_marital,
        )?;
        let bride = person_profile(
            Party::Bride,
            &submission.bride,
            bride_birthdate,
            bride_citizenship,
            bride_marital,
        )?;

        let mut parents = Vec::new();
        for (party, role, form, presence) in presences {
            if let Some(record) = parent_record(party, role, form, presence)? {
                parents.push(record);
            }
        }

        Ok(ScreenedRegistration {
            wedding_date,
            wedding_time,
            venue,
            dispensation_number,
            dispensation,
            groom,
            bride,
            parents,
            guardian,
        })
    }

    fn guardian(&self, submission: &RegistrationSubmission) -> Result<Guardian, ValidationError> {
        let form = &submission.guardian;
        let life_status =
            LifeStatus::from_label(&form.life_status).ok_or_else(|| ValidationError::InvalidChoice {
                field: "guardian.life_status".to_string(),
                value: form.life_status.clone(),
                allowed: "Hidup, Meninggal",
            })?;
        let relation =
            GuardianRelation::from_label(&form.relation).ok_or_else(|| ValidationError::InvalidChoice {
                field: "guardian.relation".to_string(),
                value: form.relation.clone(),
                allowed: "Ayah Kandung, Kakek, Saudara Laki-Laki Kandung, Saudara Laki-Laki Seayah, Keponakan Laki-Laki, Paman Kandung, Paman Seayah, Sepupu Laki-Laki, Wali Hakim, Lainnya",
            })?;
        let father_presence =
            parse_parent_presence("bride_father.presence", &submission.bride_father.presence)?;

        validate_guardian(
            GuardianCandidate {
                nik: &form.nik,
                relation,
                life_status,
            },
            FatherContext {
                presence: father_presence,
                nik: submission.bride_father.nik.as_deref(),
            },
            &submission.groom.nik,
            &submission.bride.nik,
        )?;

        if !is_valid_nik(&form.nik) {
            return Err(ValidationError::Malformed {
                field: "guardian.nik".to_string(),
                expected: "16 digits",
            });
        }
        if form.full_name.trim().chars().count() < 3 {
            return Err(ValidationError::TooShort {
                field: "guardian.full_name".to_string(),
                min: 3,
            });
        }

        Ok(Guardian {
            nik: form.nik.trim().to_string(),
            full_name: form.full_name.trim().to_string(),
            relation,
            life_status,
            attendance: GuardianAttendance::Unconfirmed,
            phone: form.phone.clone(),
            address: form.address.clone(),
        })
    }
}

fn date_field(field: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
    parse_date(raw).ok_or_else(|| ValidationError::InvalidDate {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn venue(raw: &str, address: Option<&str>) -> Result<Venue, ValidationError> {
    match raw.trim() {
        label if label == VenueKind::AtOffice.label() => Ok(Venue::AtOffice),
        label if label == VenueKind::Offsite.label() => {
            let address = address
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .ok_or_else(|| ValidationError::missing("schedule.address"))?;
            Ok(Venue::Offsite {
                address: address.to_string(),
                coordinates: None,
            })
        }
        _ => Err(ValidationError::InvalidChoice {
            field: "schedule.venue".to_string(),
            value: raw.to_string(),
            allowed: "Di KUA, Di Luar KUA",
        }),
    }
}

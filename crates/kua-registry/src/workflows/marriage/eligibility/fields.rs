use chrono::NaiveDate;

use super::ValidationError;
use crate::workflows::marriage::domain::{
    Citizenship, MaritalStatus, ParentPresence, ParentRecord, ParentRole, Party, PersonProfile,
};
use crate::workflows::marriage::forms::{ParentForm, PersonForm};

const OTHER_OCCUPATION: &str = "Lainnya";

pub fn parse_citizenship(field: &str, raw: &str) -> Result<Citizenship, ValidationError> {
    Citizenship::from_label(raw).ok_or_else(|| ValidationError::InvalidChoice {
        field: field.to_string(),
        value: raw.to_string(),
        allowed: "WNI, WNA",
    })
}

pub fn parse_marital_status(field: &str, raw: &str) -> Result<MaritalStatus, ValidationError> {
    MaritalStatus::from_label(raw).ok_or_else(|| ValidationError::InvalidChoice {
        field: field.to_string(),
        value: raw.to_string(),
        allowed: "Belum Kawin, Kawin, Cerai Hidup, Cerai Mati",
    })
}

pub fn parse_parent_presence(field: &str, raw: &str) -> Result<ParentPresence, ValidationError> {
    ParentPresence::from_label(raw).ok_or_else(|| ValidationError::InvalidChoice {
        field: field.to_string(),
        value: raw.to_string(),
        allowed: "Hidup, Meninggal, Tidak Diketahui",
    })
}

pub fn is_valid_nik(raw: &str) -> bool {
    let raw = raw.trim();
    raw.len() == 16 && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Local mobile numbers: `08` prefix, digits only, at least ten of them.
pub fn is_valid_phone(raw: &str) -> bool {
    let raw = raw.trim();
    raw.starts_with("08") && raw.len() >= 10 && raw.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_email(raw: &str) -> bool {
    let raw = raw.trim();
    match raw.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|value| value.trim()).filter(|value| !value.is_empty())
}

fn require_len(field: String, value: &str, min: usize) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if value.chars().count() < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(())
}

/// Builds the stored profile once birthdate, citizenship and marital status are parsed.
pub fn person_profile(
    party: Party,
    form: &PersonForm,
    birthdate: NaiveDate,
    citizenship: Citizenship,
    marital_status: MaritalStatus,
) -> Result<PersonProfile, ValidationError> {
    let prefix = match party {
        Party::Groom => "groom",
        Party::Bride => "bride",
    };
    let field = |name: &str| format!("{prefix}.{name}");

    if !is_valid_nik(&form.nik) {
        return Err(ValidationError::Malformed {
            field: field("nik"),
            expected: "16 digits",
        });
    }
    require_len(field("full_name"), &form.full_name, 3)?;
    require_len(field("birthplace"), &form.birthplace, 2)?;
    require_len(field("address"), &form.address, 10)?;
    require_len(field("religion"), &form.religion, 1)?;
    require_len(field("education"), &form.education, 1)?;
    require_len(field("occupation"), &form.occupation, 1)?;

    let passport_number = present(form.passport_number.as_ref());
    if citizenship == Citizenship::Foreign && passport_number.is_none() {
        return Err(ValidationError::missing(field("passport_number")));
    }

    let occupation_description = present(form.occupation_description.as_ref());
    if form.occupation.trim() == OTHER_OCCUPATION && occupation_description.is_none() {
        return Err(ValidationError::missing(field("occupation_description")));
    }

    if !is_valid_phone(&form.phone) {
        return Err(ValidationError::Malformed {
            field: field("phone"),
            expected: "starts with 08 and has at least 10 digits",
        });
    }
    if !is_valid_email(&form.email) {
        return Err(ValidationError::Malformed {
            field: field("email"),
            expected: "an e-mail address",
        });
    }

    Ok(PersonProfile {
        nik: form.nik.trim().to_string(),
        full_name: form.full_name.trim().to_string(),
        birthplace: form.birthplace.trim().to_string(),
        birthdate,
        citizenship,
        passport_number: passport_number.map(str::to_string),
        religion: form.religion.trim().to_string(),
        education: form.education.trim().to_string(),
        occupation: form.occupation.trim().to_string(),
        occupation_description: occupation_description.map(str::to_string),
        marital_status,
        address: form.address.trim().to_string(),
        phone: form.phone.trim().to_string(),
        email: form.email.trim().to_string(),
    })
}

/// `Ok(None)` for parents that are deceased or unknown; they are never stored.
pub fn parent_record(
    party: Party,
    role: ParentRole,
    form: &ParentForm,
    presence: ParentPresence,
) -> Result<Option<ParentRecord>, ValidationError> {
    if presence != ParentPresence::Alive {
        return Ok(None);
    }

    let prefix = match (party, role) {
        (Party::Groom, ParentRole::Father) => "groom_father",
        (Party::Groom, ParentRole::Mother) => "groom_mother",
        (Party::Bride, ParentRole::Father) => "bride_father",
        (Party::Bride, ParentRole::Mother) => "bride_mother",
    };
    let field = |name: &str| format!("{prefix}.{name}");
    let required = |value: Option<&String>, name: &str| {
        present(value)
            .map(str::to_string)
            .ok_or_else(|| ValidationError::missing(field(name)))
    };

    let name = required(form.name.as_ref(), "name")?;
    let citizenship_raw = required(form.citizenship.as_ref(), "citizenship")?;
    let citizenship = parse_citizenship(&field("citizenship"), &citizenship_raw)?;
    let religion = required(form.religion.as_ref(), "religion")?;
    let occupation = required(form.occupation.as_ref(), "occupation")?;
    let address = required(form.address.as_ref(), "address")?;

    let (country_of_origin, passport_number) = if citizenship == Citizenship::Foreign {
        (
            Some(required(form.country_of_origin.as_ref(), "country_of_origin")?),
            Some(required(form.passport_number.as_ref(), "passport_number")?),
        )
    } else {
        (None, None)
    };

    let occupation_description = if occupation == OTHER_OCCUPATION {
        Some(required(
            form.occupation_description.as_ref(),
            "occupation_description",
        )?)
    } else {
        None
    };

    Ok(Some(ParentRecord {
        party,
        role,
        nik: present(form.nik.as_ref()).map(str::to_string),
        name,
        citizenship,
        country_of_origin,
        passport_number,
        religion,
        occupation,
        occupation_description,
        address,
    }))
}

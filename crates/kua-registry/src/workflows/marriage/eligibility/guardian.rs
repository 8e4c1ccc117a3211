use crate::workflows::marriage::domain::{GuardianRelation, LifeStatus, ParentPresence};

/// What the form says about the bride's biological father.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatherContext<'a> {
    pub presence: ParentPresence,
    pub nik: Option<&'a str>,
}

/// Guardian as chosen on the form, already parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardianCandidate<'a> {
    pub nik: &'a str,
    pub relation: GuardianRelation,
    pub life_status: LifeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardianViolation {
    #[error("a deceased guardian cannot act as wali")]
    DeceasedGuardian,
    #[error("guardian status '{guardian}' does not match the bride's father status '{father}'")]
    FatherStatusMismatch {
        guardian: &'static str,
        father: &'static str,
    },
    #[error("guardian NIK must match the bride's father NIK when the father is the wali")]
    FatherIdentityMismatch,
    #[error("guardian NIK must differ from the {party} NIK")]
    SharesPartyIdentity { party: &'static str },
    #[error("the bride's father is alive, so the wali must be '{}'", GuardianRelation::BiologicalFather.label())]
    FatherAliveMustOfficiate { chosen: GuardianRelation },
    #[error("the bride's father is deceased, so '{}' is not an eligible wali", GuardianRelation::BiologicalFather.label())]
    FatherDeceasedCannotOfficiate,
}

/// Relations a guardian may hold given the father's presence, in precedence order.
pub fn eligible_relations(father: ParentPresence) -> Vec<GuardianRelation> {
    match father {
        ParentPresence::Alive => vec![GuardianRelation::BiologicalFather],
        ParentPresence::Deceased => GuardianRelation::PRECEDENCE
            .into_iter()
            .filter(|relation| *relation != GuardianRelation::BiologicalFather)
            .collect(),
        ParentPresence::Unknown => GuardianRelation::PRECEDENCE.to_vec(),
    }
}

pub fn validate_guardian(
    candidate: GuardianCandidate<'_>,
    father: FatherContext<'_>,
    groom_nik: &str,
    bride_nik: &str,
) -> Result<(), GuardianViolation> {
    if candidate.life_status == LifeStatus::Deceased {
        return Err(GuardianViolation::DeceasedGuardian);
    }

    if candidate.relation == GuardianRelation::BiologicalFather {
        if candidate.life_status.label() != father.presence.label() {
            return Err(GuardianViolation::FatherStatusMismatch {
                guardian: candidate.life_status.label(),
                father: father.presence.label(),
            });
        }
        if father.presence == ParentPresence::Alive
            && father.nik.map(str::trim) != Some(candidate.nik.trim())
        {
            return Err(GuardianViolation::FatherIdentityMismatch);
        }
    }

    let nik = candidate.nik.trim();
    if nik == groom_nik.trim() {
        return Err(GuardianViolation::SharesPartyIdentity {
            party: "calon suami",
        });
    }
    if nik == bride_nik.trim() {
        return Err(GuardianViolation::SharesPartyIdentity {
            party: "calon istri",
        });
    }

    if eligible_relations(father.presence).contains(&candidate.relation) {
        return Ok(());
    }
    match father.presence {
        ParentPresence::Alive => Err(GuardianViolation::FatherAliveMustOfficiate {
            chosen: candidate.relation,
        }),
        // Every relation is eligible when the father is unknown, so only deceased remains.
        ParentPresence::Deceased | ParentPresence::Unknown => {
            Err(GuardianViolation::FatherDeceasedCannotOfficiate)
        }
    }
}

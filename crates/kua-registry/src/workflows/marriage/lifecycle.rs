//! Transition table for the registration lifecycle.
//!
//! Guarded actions and the privileged override both resolve through [`next_status`],
//! so the two paths cannot disagree about which statuses are reachable.

use serde::Serialize;

use super::domain::{RegistrationRecord, RegistrationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ApproveForm,
    RejectForm,
    AcceptDocuments,
    RejectDocuments,
    ConfirmVisit,
    AssignOfficiant,
    ChangeOfficiant,
    ApproveByOfficiant,
    RejectByOfficiant,
    CompleteCounseling,
    CompleteWedding,
    Override(RegistrationStatus),
}

impl Transition {
    /// Status the registration must hold; `None` for the override path.
    pub const fn required_status(self) -> Option<RegistrationStatus> {
        use RegistrationStatus::*;
        match self {
            Self::ApproveForm | Self::RejectForm => Some(AwaitingFormReview),
            Self::AcceptDocuments | Self::RejectDocuments => Some(AwaitingDocumentSubmission),
            Self::ConfirmVisit => Some(DocumentsReceived),
            Self::AssignOfficiant => Some(AwaitingOfficiantAssignment),
            Self::ChangeOfficiant | Self::ApproveByOfficiant | Self::RejectByOfficiant => {
                Some(AwaitingOfficiantVerification)
            }
            Self::CompleteCounseling => Some(AwaitingCounseling),
            Self::CompleteWedding => Some(CounselingDone),
            Self::Override(_) => None,
        }
    }

    const fn target(self) -> RegistrationStatus {
        use RegistrationStatus::*;
        match self {
            Self::ApproveForm => AwaitingDocumentSubmission,
            Self::AcceptDocuments => DocumentsReceived,
            Self::ConfirmVisit => AwaitingOfficiantAssignment,
            Self::AssignOfficiant | Self::ChangeOfficiant => AwaitingOfficiantVerification,
            Self::ApproveByOfficiant => AwaitingCounseling,
            Self::CompleteCounseling => CounselingDone,
            Self::CompleteWedding => Completed,
            Self::RejectForm | Self::RejectDocuments | Self::RejectByOfficiant => Rejected,
            Self::Override(status) => status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("registration is '{current}' but this action requires '{required}'")]
    WrongStatus {
        current: RegistrationStatus,
        required: RegistrationStatus,
    },
    #[error("status '{target}' can only be set through officiant assignment")]
    AssignmentOnly { target: RegistrationStatus },
}

pub fn next_status(
    current: RegistrationStatus,
    transition: Transition,
) -> Result<RegistrationStatus, TransitionError> {
    if let Transition::Override(target) = transition {
        if target.is_assignment_related() {
            return Err(TransitionError::AssignmentOnly { target });
        }
        return Ok(target);
    }

    match transition.required_status() {
        Some(required) if required != current => {
            Err(TransitionError::WrongStatus { current, required })
        }
        _ => Ok(transition.target()),
    }
}

/// Statuses the override path may set.
pub fn override_targets() -> Vec<RegistrationStatus> {
    RegistrationStatus::ALL
        .into_iter()
        .filter(|status| !status.is_assignment_related())
        .collect()
}

pub const HAPPY_PATH: [RegistrationStatus; 10] = [
    RegistrationStatus::Draft,
    RegistrationStatus::AwaitingFormReview,
    RegistrationStatus::AwaitingDocumentSubmission,
    RegistrationStatus::DocumentsReceived,
    RegistrationStatus::AwaitingOfficiantAssignment,
    RegistrationStatus::OfficiantAssigned,
    RegistrationStatus::AwaitingOfficiantVerification,
    RegistrationStatus::AwaitingCounseling,
    RegistrationStatus::CounselingDone,
    RegistrationStatus::Completed,
];

const fn step_description(status: RegistrationStatus) -> &'static str {
    use RegistrationStatus::*;
    match status {
        Draft => "Data belum lengkap",
        AwaitingFormReview => "Staff verifikasi formulir online",
        AwaitingDocumentSubmission => "Formulir disetujui, siap kumpulkan berkas",
        DocumentsReceived => "Staff menerima berkas hardcopy",
        AwaitingOfficiantAssignment => "Siap untuk penugasan penghulu",
        OfficiantAssigned => "Penghulu sudah ditugaskan",
        AwaitingOfficiantVerification => "Penghulu memeriksa berkas",
        AwaitingCounseling => "Siap untuk bimbingan perkawinan",
        CounselingDone => "Bimbingan selesai",
        Completed => "Nikah telah dilaksanakan",
        Rejected => "Pendaftaran ditolak",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowStep {
    pub status: &'static str,
    pub description: &'static str,
    pub completed: bool,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusFlow {
    pub current: &'static str,
    pub terminal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<&'static str>,
    pub steps: Vec<FlowStep>,
}

/// Happy-path steps with progress flags; rejected registrations show where they stopped.
pub fn status_flow(record: &RegistrationRecord) -> StatusFlow {
    let current = record.status;
    let rejected_at = record.status_before_rejection();
    let reached = match (current, rejected_at) {
        (RegistrationStatus::Rejected, Some(previous)) => previous,
        (RegistrationStatus::Rejected, None) => RegistrationStatus::Draft,
        (status, _) => status,
    };

    let steps = HAPPY_PATH
        .into_iter()
        .map(|step| {
            let is_current = current != RegistrationStatus::Rejected && step == current;
            FlowStep {
                status: step.label(),
                description: step_description(step),
                completed: step < reached || (step == current && current.is_terminal()),
                current: is_current,
            }
        })
        .collect();

    StatusFlow {
        current: current.label(),
        terminal: current.is_terminal(),
        rejected_at: rejected_at.map(RegistrationStatus::label),
        steps,
    }
}

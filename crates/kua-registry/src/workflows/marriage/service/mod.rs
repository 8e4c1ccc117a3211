//! Services that load state through the repositories, apply the domain rules, and
//! persist the result. Notifications and geocoding are enqueued only after a
//! successful write, and failures there are logged, never returned.

mod access;
mod agenda;
mod counseling;
mod registration;

use std::sync::Arc;

use axum::http::StatusCode;
use tracing::warn;

pub use access::AccessDenied;
pub use agenda::AgendaService;
pub use counseling::CounselingService;
pub use registration::{AssignmentOutcome, RegistrationService, ReviewDecision};

use super::agenda::AgendaError;
use super::calendar::{Clock, SystemClock};
use super::counseling::CounselingViolation;
use super::domain::{RegistrationNumber, RegistrationStatus};
use super::eligibility::ValidationError;
use super::geocoding::GeocodeQueue;
use super::lifecycle::TransitionError;
use super::notifications::{NotificationEvent, NotificationSink};
use super::repository::{RegistryStore, RepositoryError};
use super::scheduling::{ScheduleConflict, SchedulingConfig};

/// Machine-readable error category shared by every workflow failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Precondition,
    Conflict,
    NotFound,
    Authorization,
    Storage,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Precondition => "precondition",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Authorization => "authorization",
            Self::Storage => "storage",
        }
    }

    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::Validation | Self::Precondition => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("registration is '{current}' but this action requires '{required}'")]
    Precondition {
        current: RegistrationStatus,
        required: RegistrationStatus,
    },
    #[error(transparent)]
    Schedule(#[from] ScheduleConflict),
    #[error(transparent)]
    Counseling(CounselingViolation),
    #[error("applicant already has an active registration ({number})")]
    ActiveRegistrationExists { number: RegistrationNumber },
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Authorization(#[from] AccessDenied),
    #[error(transparent)]
    Agenda(#[from] AgendaError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Agenda(_) => ErrorKind::Validation,
            Self::Precondition { .. } => ErrorKind::Precondition,
            Self::Schedule(ScheduleConflict::NoCurrentOfficiant) => ErrorKind::Precondition,
            Self::Schedule(
                ScheduleConflict::SameOfficiant { .. } | ScheduleConflict::OfficiantInactive { .. },
            ) => ErrorKind::Validation,
            Self::Schedule(_) | Self::ActiveRegistrationExists { .. } => ErrorKind::Conflict,
            Self::Counseling(violation) if violation.is_conflict() => ErrorKind::Conflict,
            Self::Counseling(CounselingViolation::NotEnrolled { .. }) => ErrorKind::Precondition,
            Self::Counseling(_) => ErrorKind::Validation,
            Self::NotFound { .. } | Self::Repository(RepositoryError::NotFound) => {
                ErrorKind::NotFound
            }
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Repository(RepositoryError::Conflict) => ErrorKind::Conflict,
            Self::Repository(RepositoryError::Unavailable(_)) => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<TransitionError> for WorkflowError {
    fn from(value: TransitionError) -> Self {
        match value {
            TransitionError::WrongStatus { current, required } => {
                Self::Precondition { current, required }
            }
            TransitionError::AssignmentOnly { target } => {
                Self::Authorization(AccessDenied::AssignmentOnly { target })
            }
        }
    }
}

impl From<CounselingViolation> for WorkflowError {
    fn from(value: CounselingViolation) -> Self {
        match value {
            CounselingViolation::RegistrationNotReady { status } => Self::Precondition {
                current: status,
                required: RegistrationStatus::AwaitingCounseling,
            },
            other => Self::Counseling(other),
        }
    }
}

/// Best-effort delivery into the outbox.
pub(crate) fn publish_all<N>(notifier: &N, events: Vec<NotificationEvent>)
where
    N: NotificationSink + ?Sized,
{
    for event in events {
        let kind = event.kind;
        if let Err(error) = notifier.enqueue(event) {
            warn!(?kind, %error, "failed to enqueue notification");
        }
    }
}

/// Facade bundling the three services over one store and one outbox.
pub struct MarriageWorkflow<S, N> {
    registrations: RegistrationService<S, N>,
    counseling: CounselingService<S, N>,
    agenda: AgendaService<S>,
}

impl<S, N> MarriageWorkflow<S, N>
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: SchedulingConfig) -> Self {
        Self::with_clock(store, notifier, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        notifier: Arc<N>,
        config: SchedulingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registrations: RegistrationService::new(
                store.clone(),
                notifier.clone(),
                config,
                clock.clone(),
            ),
            counseling: CounselingService::new(store.clone(), notifier, clock.clone()),
            agenda: AgendaService::new(store, config, clock),
        }
    }

    pub fn with_geocoding(mut self, queue: GeocodeQueue) -> Self {
        self.registrations = self.registrations.with_geocoding(queue);
        self
    }

    pub fn registrations(&self) -> &RegistrationService<S, N> {
        &self.registrations
    }

    pub fn counseling(&self) -> &CounselingService<S, N> {
        &self.counseling
    }

    pub fn agenda(&self) -> &AgendaService<S> {
        &self.agenda
    }
}

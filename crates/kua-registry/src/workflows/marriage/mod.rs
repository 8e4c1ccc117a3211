//! Marriage registration at the district religious affairs office (KUA).
//!
//! Covers intake screening, the registration lifecycle, officiant scheduling,
//! pre-marriage counseling, and the public calendars. Storage, notification
//! delivery, and geocoding sit behind traits implemented by the host service.

pub mod agenda;
pub mod calendar;
pub mod counseling;
pub mod domain;
pub mod eligibility;
pub mod forms;
pub mod geocoding;
pub mod lifecycle;
pub(crate) mod notices;
pub mod notifications;
pub mod reminders;
pub mod repository;
pub mod router;
pub mod scheduling;
pub mod service;

#[cfg(test)]
mod tests;

pub use calendar::{Clock, FixedClock, SystemClock};
pub use counseling::{
    AttendanceUpdate, CounselingSession, CounselingViolation, Enrollment, SessionDraft, SessionId,
    SessionUpdate,
};
pub use domain::{
    Actor, Officiant, OfficiantId, RegistrationId, RegistrationRecord, RegistrationStatus, Role,
    UserId, Venue,
};
pub use forms::RegistrationSubmission;
pub use geocoding::{CachedGeocoder, GeocodeError, GeocodeQueue, GeocodeWorker, Geocoder};
pub use lifecycle::{StatusFlow, Transition};
pub use notifications::{
    NotificationError, NotificationEvent, NotificationOutbox, NotificationPublisher,
    NotificationSink, NotificationWorker,
};
pub use reminders::{ReminderReport, ReminderScanner};
pub use repository::{
    CounselingRepository, OfficiantRepository, RegistrationRepository, RegistryStore,
    RepositoryError,
};
pub use router::marriage_router;
pub use scheduling::{ConflictDetector, ScheduleConflict, SchedulingConfig};
pub use service::{ErrorKind, MarriageWorkflow, WorkflowError};

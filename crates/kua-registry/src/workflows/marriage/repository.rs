use chrono::NaiveDate;

use super::counseling::{CounselingSession, Enrollment, EnrollmentId, SessionId};
use super::domain::{
    Coordinates, Officiant, OfficiantId, RegistrationId, RegistrationRecord, UserId,
};

/// Storage for registrations. `insert_registration` writes the registration together
/// with its profiles, parents and guardian, so it must be all-or-nothing.
pub trait RegistrationRepository: Send + Sync {
    /// Fails with `Conflict` when the id is taken or when the applicant already holds
    /// an active registration. The applicant check happens in the same write as the
    /// insert, so concurrent submissions cannot both succeed.
    fn insert_registration(
        &self,
        record: RegistrationRecord,
    ) -> Result<RegistrationRecord, RepositoryError>;
    fn update_registration(&self, record: RegistrationRecord) -> Result<(), RepositoryError>;
    fn fetch_registration(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<RegistrationRecord>, RepositoryError>;
    /// The applicant's non-terminal registration, if any.
    fn active_registration_for(
        &self,
        applicant: &UserId,
    ) -> Result<Option<RegistrationRecord>, RepositoryError>;
    fn registrations_on(&self, date: NaiveDate)
        -> Result<Vec<RegistrationRecord>, RepositoryError>;
    fn registrations_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RegistrationRecord>, RepositoryError>;
    /// Writes geocoded coordinates for an offsite venue; repeating the call is harmless.
    fn set_coordinates(
        &self,
        id: &RegistrationId,
        coordinates: Coordinates,
    ) -> Result<(), RepositoryError>;
}

pub trait OfficiantRepository: Send + Sync {
    fn fetch_officiant(&self, id: &OfficiantId) -> Result<Option<Officiant>, RepositoryError>;
    fn active_officiants(&self) -> Result<Vec<Officiant>, RepositoryError>;
}

pub trait CounselingRepository: Send + Sync {
    fn insert_session(
        &self,
        session: CounselingSession,
    ) -> Result<CounselingSession, RepositoryError>;
    fn update_session(&self, session: CounselingSession) -> Result<(), RepositoryError>;
    fn fetch_session(&self, id: &SessionId) -> Result<Option<CounselingSession>, RepositoryError>;
    fn sessions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CounselingSession>, RepositoryError>;
    /// Fails with `Conflict` when the registration already holds a seat in the session.
    fn insert_enrollment(&self, enrollment: Enrollment) -> Result<Enrollment, RepositoryError>;
    fn update_enrollment(&self, enrollment: Enrollment) -> Result<(), RepositoryError>;
    fn fetch_enrollment(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, RepositoryError>;
    fn enrollments_for_session(&self, id: &SessionId) -> Result<Vec<Enrollment>, RepositoryError>;
    fn enrollment_for_registration(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<Enrollment>, RepositoryError>;
}

/// Everything the marriage workflow reads and writes.
pub trait RegistryStore: RegistrationRepository + OfficiantRepository + CounselingRepository {}

impl<T> RegistryStore for T where
    T: RegistrationRepository + OfficiantRepository + CounselingRepository
{
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

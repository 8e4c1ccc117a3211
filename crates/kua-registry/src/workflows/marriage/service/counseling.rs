use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::access::{require_role, AccessDenied, OFFICE};
use super::registration::advance;
use super::{publish_all, WorkflowError};
use crate::workflows::marriage::calendar::Clock;
use crate::workflows::marriage::counseling::{
    check_capacity, check_enrollable, check_schedulable, AttendanceStatus, AttendanceUpdate,
    CertificateStatus, CounselingSession, CounselingViolation, Enrollment, EnrollmentId,
    Participant, SessionDraft, SessionId, SessionStatus, SessionUpdate, DEFAULT_CAPACITY,
};
use crate::workflows::marriage::domain::{
    Actor, CounselingStatus, RegistrationId, RegistrationRecord, Role,
};
use crate::workflows::marriage::lifecycle::{next_status, Transition};
use crate::workflows::marriage::notices;
use crate::workflows::marriage::notifications::{NotificationKind, NotificationSink, Recipient};
use crate::workflows::marriage::repository::RegistryStore;

/// Counseling sessions, enrollment, and attendance.
pub struct CounselingService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    sessions: AtomicU64,
    enrollments: AtomicU64,
}

impl<S, N> CounselingService<S, N>
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
            sessions: AtomicU64::new(1),
            enrollments: AtomicU64::new(1),
        }
    }

    fn load_session(&self, id: &SessionId) -> Result<CounselingSession, WorkflowError> {
        self.store
            .fetch_session(id)?
            .ok_or_else(|| WorkflowError::not_found("counseling session", id))
    }

    fn load_registration(&self, id: &RegistrationId) -> Result<RegistrationRecord, WorkflowError> {
        self.store
            .fetch_registration(id)?
            .ok_or_else(|| WorkflowError::not_found("registration", id))
    }

    pub fn get_session(&self, id: &SessionId) -> Result<CounselingSession, WorkflowError> {
        self.load_session(id)
    }

    pub fn create_session(
        &self,
        actor: &Actor,
        draft: SessionDraft,
    ) -> Result<CounselingSession, WorkflowError> {
        require_role(actor, &OFFICE, "schedule counseling sessions")?;
        let now = self.clock.now();
        let same_day = self.store.sessions_between(draft.date, draft.date)?;
        check_schedulable(
            draft.date,
            draft.start_time,
            draft.end_time,
            now.date(),
            &same_day,
            None,
        )?;
        let capacity = draft.capacity.unwrap_or(DEFAULT_CAPACITY);
        check_capacity(capacity, 0)?;

        let seq = self.sessions.fetch_add(1, Ordering::Relaxed);
        let session = CounselingSession {
            id: SessionId(format!("ses-{seq:06}")),
            date: draft.date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            venue: draft.venue,
            counselor: draft.counselor,
            capacity,
            status: SessionStatus::Active,
            notes: draft.notes,
            created_by: actor.id.clone(),
            created_at: now,
            updated_at: now,
        };
        let stored = self.store.insert_session(session)?;
        info!(
            session = %stored.id,
            date = %stored.date,
            capacity = stored.capacity,
            "counseling session scheduled"
        );

        publish_all(
            self.notifier.as_ref(),
            vec![notices::session_event(
                NotificationKind::SessionCreated,
                &stored,
                Recipient::Role(Role::Applicant),
            )],
        );
        Ok(stored)
    }

    /// Applies a partial update. Date and time changes, and reactivation of an inactive
    /// session, are re-validated against the other sessions; capacity may not drop below
    /// the current enrollment.
    pub fn update_session(
        &self,
        actor: &Actor,
        id: &SessionId,
        update: SessionUpdate,
    ) -> Result<CounselingSession, WorkflowError> {
        require_role(actor, &OFFICE, "update counseling sessions")?;
        let mut session = self.load_session(id)?;
        let enrolled = self.store.enrollments_for_session(id)?;
        let now = self.clock.now();

        let rescheduled =
            update.date.is_some() || update.start_time.is_some() || update.end_time.is_some();
        if let Some(date) = update.date {
            session.date = date;
        }
        if let Some(start) = update.start_time {
            session.start_time = start;
        }
        if let Some(end) = update.end_time {
            session.end_time = end;
        }
        let was_active = session.is_active();
        if let Some(status) = update.status {
            session.status = status;
        }
        // Reactivation is checked like a reschedule so a date keeps one active session.
        if rescheduled || (session.is_active() && !was_active) {
            let same_day = self.store.sessions_between(session.date, session.date)?;
            check_schedulable(
                session.date,
                session.start_time,
                session.end_time,
                now.date(),
                &same_day,
                Some(id),
            )?;
        }
        if let Some(capacity) = update.capacity {
            check_capacity(capacity, enrolled.len())?;
            session.capacity = capacity;
        }
        if let Some(venue) = update.venue {
            session.venue = venue;
        }
        if let Some(counselor) = update.counselor {
            session.counselor = counselor;
        }
        if update.notes.is_some() {
            session.notes = update.notes;
        }
        session.updated_at = now;

        self.store.update_session(session.clone())?;
        info!(session = %session.id, date = %session.date, "counseling session updated");

        let kind = if session.status == SessionStatus::Cancelled {
            NotificationKind::SessionCancelled
        } else {
            NotificationKind::SessionUpdated
        };
        self.notify_participants(kind, &session, &enrolled);
        Ok(session)
    }

    pub fn cancel_session(
        &self,
        actor: &Actor,
        id: &SessionId,
    ) -> Result<CounselingSession, WorkflowError> {
        require_role(actor, &OFFICE, "cancel counseling sessions")?;
        let mut session = self.load_session(id)?;
        if !session.is_active() {
            return Err(CounselingViolation::SessionInactive {
                session: session.id,
                status: session.status.label(),
            }
            .into());
        }
        let enrolled = self.store.enrollments_for_session(id)?;
        session.status = SessionStatus::Cancelled;
        session.updated_at = self.clock.now();
        self.store.update_session(session.clone())?;
        info!(
            session = %session.id,
            participants = enrolled.len(),
            "counseling session cancelled"
        );

        self.notify_participants(NotificationKind::SessionCancelled, &session, &enrolled);
        Ok(session)
    }

    fn notify_participants(
        &self,
        kind: NotificationKind,
        session: &CounselingSession,
        enrolled: &[Enrollment],
    ) {
        let events = enrolled
            .iter()
            .map(|enrollment| {
                notices::session_event(kind, session, Recipient::User(enrollment.applicant.clone()))
            })
            .collect();
        publish_all(self.notifier.as_ref(), events);
    }

    /// Seats a registration awaiting counseling in an active, upcoming session.
    pub fn enroll(
        &self,
        actor: &Actor,
        session_id: &SessionId,
        registration_id: &RegistrationId,
    ) -> Result<Enrollment, WorkflowError> {
        let registration = self.load_registration(registration_id)?;
        let owns = actor.role == Role::Applicant && actor.id == registration.applicant;
        if !owns && !OFFICE.contains(&actor.role) {
            return Err(AccessDenied::NotOwner {
                action: "enroll in counseling",
            }
            .into());
        }

        let session = self.load_session(session_id)?;
        let now = self.clock.now();
        let enrolled = self.store.enrollments_for_session(session_id)?;
        check_enrollable(
            &session,
            now.date(),
            registration_id,
            registration.status,
            &enrolled,
        )?;

        let seq = self.enrollments.fetch_add(1, Ordering::Relaxed);
        let enrollment = Enrollment {
            id: EnrollmentId(format!("enr-{seq:06}")),
            session: session.id.clone(),
            registration: registration.id.clone(),
            applicant: registration.applicant.clone(),
            enrolled_at: now,
            attendance: AttendanceStatus::NotYet,
            certificate: CertificateStatus::NotIssued,
            certificate_number: None,
        };
        let stored = self.store.insert_enrollment(enrollment)?;
        info!(
            session = %session.id,
            registration = %registration.number,
            seats_left = session.remaining_capacity(enrolled.len() + 1),
            "registration enrolled in counseling"
        );
        Ok(stored)
    }

    pub fn participants(&self, session_id: &SessionId) -> Result<Vec<Participant>, WorkflowError> {
        self.load_session(session_id)?;
        let mut participants = Vec::new();
        for enrollment in self.store.enrollments_for_session(session_id)? {
            let registration = self.load_registration(&enrollment.registration)?;
            participants.push(Participant {
                enrollment: enrollment.id,
                registration: registration.id,
                number: registration.number,
                attendance: enrollment.attendance,
                certificate: enrollment.certificate,
                certificate_number: enrollment.certificate_number,
            });
        }
        Ok(participants)
    }

    pub fn update_attendance(
        &self,
        actor: &Actor,
        enrollment_id: &EnrollmentId,
        update: AttendanceUpdate,
    ) -> Result<Enrollment, WorkflowError> {
        require_role(actor, &OFFICE, "record counseling attendance")?;
        let mut enrollment = self
            .store
            .fetch_enrollment(enrollment_id)?
            .ok_or_else(|| WorkflowError::not_found("enrollment", enrollment_id))?;
        enrollment.attendance = update.attendance;
        enrollment.certificate = update.certificate;
        if update.certificate_number.is_some() {
            enrollment.certificate_number = update.certificate_number;
        }
        self.store.update_enrollment(enrollment.clone())?;
        info!(
            enrollment = %enrollment.id,
            attendance = ?enrollment.attendance,
            "counseling attendance recorded"
        );
        Ok(enrollment)
    }

    /// Marks counseling done: the registration moves to `Sudah Bimbingan` and its
    /// enrollment is recorded as attended with a certificate.
    pub fn complete_counseling(
        &self,
        actor: &Actor,
        registration_id: &RegistrationId,
    ) -> Result<RegistrationRecord, WorkflowError> {
        require_role(actor, &OFFICE, "complete counseling")?;
        let mut record = self.load_registration(registration_id)?;
        next_status(record.status, Transition::CompleteCounseling)?;
        let mut enrollment = self
            .store
            .enrollment_for_registration(registration_id)?
            .ok_or_else(|| CounselingViolation::NotEnrolled {
                registration: registration_id.clone(),
            })?;

        let original = record.clone();
        let now = self.clock.now();
        let previous = advance(
            &mut record,
            Transition::CompleteCounseling,
            actor,
            None,
            now,
        )?;
        record.counseling_status = CounselingStatus::Done;

        enrollment.attendance = AttendanceStatus::Present;
        enrollment.certificate = CertificateStatus::Issued;
        self.store.update_registration(record.clone())?;
        if let Err(error) = self.store.update_enrollment(enrollment) {
            // Both rows change together or neither does.
            if let Err(restore) = self.store.update_registration(original) {
                warn!(
                    registration = %record.number,
                    error = %restore,
                    "failed to restore registration after enrollment write failed"
                );
            }
            return Err(error.into());
        }
        info!(
            registration = %record.number,
            from = %previous,
            to = %record.status,
            actor = %actor.id,
            "registration status changed"
        );

        publish_all(
            self.notifier.as_ref(),
            vec![notices::status_changed(&record).by(&actor.id)],
        );
        Ok(record)
    }
}

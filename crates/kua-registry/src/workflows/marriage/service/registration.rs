use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use super::access::{require_role, AccessDenied, HEAD_OF_OFFICE, OFFICE, OVERRIDE};
use super::{publish_all, WorkflowError};
use crate::workflows::marriage::calendar::Clock;
use crate::workflows::marriage::domain::{
    Actor, CounselingStatus, Officiant, OfficiantId, RegistrationId, RegistrationNumber,
    RegistrationRecord, RegistrationStatus, Role, StatusChange, Venue,
};
use crate::workflows::marriage::eligibility::{IntakeGuard, ValidationError};
use crate::workflows::marriage::forms::RegistrationSubmission;
use crate::workflows::marriage::geocoding::{GeocodeJob, GeocodeQueue};
use crate::workflows::marriage::lifecycle::{self, next_status, StatusFlow, Transition};
use crate::workflows::marriage::notices;
use crate::workflows::marriage::notifications::NotificationSink;
use crate::workflows::marriage::repository::{RegistryStore, RepositoryError};
use crate::workflows::marriage::scheduling::{
    AssignmentCheck, ConflictDetector, ScheduleConflict, SchedulingConfig,
};

/// Outcome of a review step. Rejections always carry a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve { note: Option<String> },
    Reject { note: String },
}

impl ReviewDecision {
    pub fn from_flag(approved: bool, note: Option<String>) -> Result<Self, ValidationError> {
        let note = note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty());
        match (approved, note) {
            (true, note) => Ok(Self::Approve { note }),
            (false, Some(note)) => Ok(Self::Reject { note }),
            (false, None) => Err(ValidationError::missing("note")),
        }
    }

    fn into_parts(self, approve: Transition, reject: Transition) -> (Transition, Option<String>) {
        match self {
            Self::Approve { note } => (approve, note),
            Self::Reject { note } => (reject, Some(note)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentOutcome {
    pub registration: RegistrationRecord,
    pub check: AssignmentCheck,
}

/// Applies `transition`, appending to the audit trail. Returns the previous status.
pub(super) fn advance(
    record: &mut RegistrationRecord,
    transition: Transition,
    actor: &Actor,
    note: Option<String>,
    now: NaiveDateTime,
) -> Result<RegistrationStatus, WorkflowError> {
    let next = next_status(record.status, transition)?;
    let previous = record.status;
    record.history.push(StatusChange {
        from: previous,
        to: next,
        actor: actor.id.clone(),
        at: now,
        note: note.clone(),
    });
    record.status = next;
    record.updated_at = now;
    if note.is_some() {
        record.notes = note;
    }
    Ok(previous)
}

/// Registration intake, review steps, and officiant assignment.
pub struct RegistrationService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    guard: IntakeGuard,
    detector: ConflictDetector,
    geocoding: Option<GeocodeQueue>,
    sequence: AtomicU64,
}

impl<S, N> RegistrationService<S, N>
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        config: SchedulingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            guard: IntakeGuard,
            detector: ConflictDetector::new(config),
            geocoding: None,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn with_geocoding(mut self, queue: GeocodeQueue) -> Self {
        self.geocoding = Some(queue);
        self
    }

    fn next_identity(&self, now: NaiveDateTime) -> (RegistrationId, RegistrationNumber) {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        (
            RegistrationId(format!("reg-{seq:06}")),
            RegistrationNumber(format!("NKH{}{seq:04}", now.format("%Y%m%d"))),
        )
    }

    pub(super) fn load(&self, id: &RegistrationId) -> Result<RegistrationRecord, WorkflowError> {
        self.store
            .fetch_registration(id)?
            .ok_or_else(|| WorkflowError::not_found("registration", id))
    }

    fn load_officiant(&self, id: &OfficiantId) -> Result<Officiant, WorkflowError> {
        self.store
            .fetch_officiant(id)?
            .ok_or_else(|| WorkflowError::not_found("officiant", id))
    }

    fn commit(
        &self,
        record: &RegistrationRecord,
        previous: RegistrationStatus,
        actor: &Actor,
    ) -> Result<(), WorkflowError> {
        self.store.update_registration(record.clone())?;
        info!(
            registration = %record.number,
            from = %previous,
            to = %record.status,
            actor = %actor.id,
            "registration status changed"
        );
        Ok(())
    }

    /// Screens and stores a new registration in `Menunggu Verifikasi`.
    pub fn submit(
        &self,
        actor: &Actor,
        submission: RegistrationSubmission,
    ) -> Result<RegistrationRecord, WorkflowError> {
        require_role(actor, &[Role::Applicant], "submit a registration")?;
        let now = self.clock.now();

        if let Some(existing) = self.store.active_registration_for(&actor.id)? {
            return Err(WorkflowError::ActiveRegistrationExists {
                number: existing.number,
            });
        }

        let screened = self.guard.screen(&submission, now)?;
        let (id, number) = self.next_identity(now);
        let record = RegistrationRecord {
            id,
            number,
            applicant: actor.id.clone(),
            groom: screened.groom,
            bride: screened.bride,
            parents: screened.parents,
            guardian: screened.guardian,
            submitted_at: now,
            wedding_date: screened.wedding_date,
            wedding_time: screened.wedding_time,
            venue: screened.venue,
            dispensation_number: screened.dispensation_number,
            status: RegistrationStatus::AwaitingFormReview,
            counseling_status: CounselingStatus::NotYet,
            officiant: None,
            assigned_by: None,
            assigned_at: None,
            notes: None,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
            history: vec![StatusChange {
                from: RegistrationStatus::Draft,
                to: RegistrationStatus::AwaitingFormReview,
                actor: actor.id.clone(),
                at: now,
                note: None,
            }],
        };

        let stored = match self.store.insert_registration(record) {
            Err(RepositoryError::Conflict) => {
                // Another submission for the same applicant won the insert.
                return Err(match self.store.active_registration_for(&actor.id)? {
                    Some(existing) => WorkflowError::ActiveRegistrationExists {
                        number: existing.number,
                    },
                    None => RepositoryError::Conflict.into(),
                });
            }
            other => other?,
        };
        info!(
            registration = %stored.number,
            applicant = %stored.applicant,
            wedding_date = %stored.wedding_date,
            dispensation = stored.dispensation_number.is_some(),
            "registration submitted"
        );

        if let (Venue::Offsite { address, .. }, Some(queue)) = (&stored.venue, &self.geocoding) {
            let job = GeocodeJob {
                registration: stored.id.clone(),
                address: address.clone(),
            };
            if let Err(error) = queue.enqueue(job) {
                warn!(registration = %stored.number, %error, "failed to enqueue geocoding");
            }
        }

        publish_all(self.notifier.as_ref(), notices::registration_created(&stored));
        Ok(stored)
    }

    pub fn get(&self, id: &RegistrationId) -> Result<RegistrationRecord, WorkflowError> {
        self.load(id)
    }

    pub fn status_flow(&self, id: &RegistrationId) -> Result<StatusFlow, WorkflowError> {
        let record = self.load(id)?;
        Ok(lifecycle::status_flow(&record))
    }

    fn review(
        &self,
        actor: &Actor,
        id: &RegistrationId,
        decision: ReviewDecision,
        approve: Transition,
        reject: Transition,
    ) -> Result<RegistrationRecord, WorkflowError> {
        let mut record = self.load(id)?;
        let (transition, note) = decision.into_parts(approve, reject);
        let now = self.clock.now();
        let previous = advance(&mut record, transition, actor, note, now)?;
        if transition == Transition::ApproveForm {
            record.approved_by = Some(actor.id.clone());
            record.approved_at = Some(now);
        }
        self.commit(&record, previous, actor)?;
        publish_all(
            self.notifier.as_ref(),
            vec![notices::status_changed(&record).by(&actor.id)],
        );
        Ok(record)
    }

    pub fn review_form(
        &self,
        actor: &Actor,
        id: &RegistrationId,
        decision: ReviewDecision,
    ) -> Result<RegistrationRecord, WorkflowError> {
        require_role(actor, &OFFICE, "review registration forms")?;
        self.review(
            actor,
            id,
            decision,
            Transition::ApproveForm,
            Transition::RejectForm,
        )
    }

    pub fn review_documents(
        &self,
        actor: &Actor,
        id: &RegistrationId,
        decision: ReviewDecision,
    ) -> Result<RegistrationRecord, WorkflowError> {
        require_role(actor, &OFFICE, "check submitted documents")?;
        self.review(
            actor,
            id,
            decision,
            Transition::AcceptDocuments,
            Transition::RejectDocuments,
        )
    }

    pub fn confirm_visit(
        &self,
        actor: &Actor,
        id: &RegistrationId,
    ) -> Result<RegistrationRecord, WorkflowError> {
        let mut record = self.load(id)?;
        if actor.role != Role::Applicant || actor.id != record.applicant {
            return Err(AccessDenied::NotOwner {
                action: "confirm the office visit",
            }
            .into());
        }
        let previous = advance(
            &mut record,
            Transition::ConfirmVisit,
            actor,
            None,
            self.clock.now(),
        )?;
        self.commit(&record, previous, actor)?;
        publish_all(self.notifier.as_ref(), notices::visit_confirmed(&record));
        Ok(record)
    }

    fn active_officiant(&self, id: &OfficiantId) -> Result<Officiant, WorkflowError> {
        let officiant = self.load_officiant(id)?;
        if !officiant.is_active() {
            return Err(ScheduleConflict::OfficiantInactive {
                officiant: officiant.id,
            }
            .into());
        }
        Ok(officiant)
    }

    pub fn assign_officiant(
        &self,
        actor: &Actor,
        id: &RegistrationId,
        officiant_id: &OfficiantId,
    ) -> Result<AssignmentOutcome, WorkflowError> {
        require_role(actor, &HEAD_OF_OFFICE, "assign officiants")?;
        let mut record = self.load(id)?;
        next_status(record.status, Transition::AssignOfficiant)?;
        let officiant = self.active_officiant(officiant_id)?;

        let day = self.store.registrations_on(record.wedding_date)?;
        let check = self
            .detector
            .check_assignment(&record, &officiant.id, &day)?;

        let now = self.clock.now();
        record.officiant = Some(officiant.id.clone());
        record.assigned_by = Some(actor.id.clone());
        record.assigned_at = Some(now);
        let previous = advance(&mut record, Transition::AssignOfficiant, actor, None, now)?;
        self.commit(&record, previous, actor)?;

        info!(
            registration = %record.number,
            officiant = %officiant.id,
            day_count = check.officiant_day_count,
            "officiant assigned"
        );
        if let Some(warning) = &check.warning {
            warn!(registration = %record.number, officiant = %officiant.id, "{warning}");
        }

        publish_all(
            self.notifier.as_ref(),
            notices::officiant_assigned(&record, &officiant),
        );
        Ok(AssignmentOutcome {
            registration: record,
            check,
        })
    }

    /// Replaces the assigned officiant. The daily quota is a hard limit here.
    pub fn change_officiant(
        &self,
        actor: &Actor,
        id: &RegistrationId,
        officiant_id: &OfficiantId,
        reason: Option<String>,
    ) -> Result<AssignmentOutcome, WorkflowError> {
        require_role(actor, &HEAD_OF_OFFICE, "change officiants")?;
        let mut record = self.load(id)?;
        next_status(record.status, Transition::ChangeOfficiant)?;
        let replacement = self.active_officiant(officiant_id)?;

        let day = self.store.registrations_on(record.wedding_date)?;
        let check = self.detector.check_change(&record, &replacement.id, &day)?;

        let previous_officiant = match record.officiant.as_ref() {
            Some(current) => self.store.fetch_officiant(current)?,
            None => None,
        };
        let previous_label = record
            .officiant
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        let mut trail = format!(
            "Penghulu diganti dari {previous_label} ke {}",
            replacement.id
        );
        if let Some(reason) = reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            trail.push_str(": ");
            trail.push_str(reason);
        }

        let now = self.clock.now();
        record.officiant = Some(replacement.id.clone());
        record.assigned_by = Some(actor.id.clone());
        record.assigned_at = Some(now);
        let previous = advance(
            &mut record,
            Transition::ChangeOfficiant,
            actor,
            Some(trail),
            now,
        )?;
        self.commit(&record, previous, actor)?;

        info!(
            registration = %record.number,
            from = %previous_label,
            to = %replacement.id,
            "officiant changed"
        );
        publish_all(
            self.notifier.as_ref(),
            notices::officiant_changed(&record, previous_officiant.as_ref(), &replacement),
        );
        Ok(AssignmentOutcome {
            registration: record,
            check,
        })
    }

    /// Document verification by the officiant tied to the registration.
    pub fn officiant_review(
        &self,
        actor: &Actor,
        id: &RegistrationId,
        decision: ReviewDecision,
    ) -> Result<RegistrationRecord, WorkflowError> {
        require_role(actor, &[Role::Officiant], "verify documents as officiant")?;
        let mut record = self.load(id)?;
        next_status(record.status, Transition::ApproveByOfficiant)?;

        let assigned = match record.officiant.as_ref() {
            Some(officiant) => self.store.fetch_officiant(officiant)?,
            None => None,
        };
        match assigned {
            Some(officiant) if officiant.user_id == actor.id => {}
            _ => return Err(AccessDenied::NotAssignedOfficiant.into()),
        }

        let (transition, note) = decision.into_parts(
            Transition::ApproveByOfficiant,
            Transition::RejectByOfficiant,
        );
        let previous = advance(&mut record, transition, actor, note, self.clock.now())?;
        self.commit(&record, previous, actor)?;
        publish_all(
            self.notifier.as_ref(),
            vec![notices::status_changed(&record).by(&actor.id)],
        );
        Ok(record)
    }

    pub fn complete_wedding(
        &self,
        actor: &Actor,
        id: &RegistrationId,
    ) -> Result<RegistrationRecord, WorkflowError> {
        require_role(actor, &OFFICE, "complete weddings")?;
        let mut record = self.load(id)?;
        let previous = advance(
            &mut record,
            Transition::CompleteWedding,
            actor,
            None,
            self.clock.now(),
        )?;
        record.counseling_status = CounselingStatus::CertificateIssued;
        self.commit(&record, previous, actor)?;
        publish_all(
            self.notifier.as_ref(),
            vec![notices::status_changed(&record).by(&actor.id)],
        );
        Ok(record)
    }

    /// Privileged status change outside the guarded sequence.
    pub fn override_status(
        &self,
        actor: &Actor,
        id: &RegistrationId,
        target: RegistrationStatus,
        note: Option<String>,
    ) -> Result<RegistrationRecord, WorkflowError> {
        require_role(actor, &OVERRIDE, "change registration status")?;
        let mut record = self.load(id)?;
        if record.status.is_terminal() && !target.is_terminal() {
            if let Some(existing) = self.store.active_registration_for(&record.applicant)? {
                if existing.id != record.id {
                    return Err(WorkflowError::ActiveRegistrationExists {
                        number: existing.number,
                    });
                }
            }
        }
        let note = note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty());
        let previous = advance(
            &mut record,
            Transition::Override(target),
            actor,
            note,
            self.clock.now(),
        )?;
        self.commit(&record, previous, actor)?;
        publish_all(
            self.notifier.as_ref(),
            vec![notices::status_changed(&record).by(&actor.id)],
        );
        Ok(record)
    }
}

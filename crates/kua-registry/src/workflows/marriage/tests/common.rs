use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::workflows::marriage::calendar::{Clock, FixedClock};
use crate::workflows::marriage::counseling::{
    CounselingSession, Enrollment, EnrollmentId, SessionDraft, SessionId,
};
use crate::workflows::marriage::domain::{
    Actor, Citizenship, Coordinates, CounselingStatus, Guardian, GuardianAttendance,
    GuardianRelation, LifeStatus, MaritalStatus, Officiant, OfficiantId, OfficiantStatus,
    PersonProfile, RegistrationId, RegistrationNumber, RegistrationRecord, RegistrationStatus,
    Role, UserId, Venue,
};
use crate::workflows::marriage::forms::{
    GuardianForm, ParentForm, PersonForm, RegistrationSubmission, ScheduleForm,
};
use crate::workflows::marriage::notifications::{
    NotificationError, NotificationEvent, NotificationSink, Recipient,
};
use crate::workflows::marriage::repository::{
    CounselingRepository, OfficiantRepository, RegistrationRepository, RepositoryError,
};
use crate::workflows::marriage::scheduling::SchedulingConfig;
use crate::workflows::marriage::service::{MarriageWorkflow, ReviewDecision};

pub(super) const GROOM_NIK: &str = "6371010101950001";
pub(super) const BRIDE_NIK: &str = "6371014101970002";
pub(super) const FATHER_NIK: &str = "6371010101650003";
pub(super) const GRANDFATHER_NIK: &str = "6371010101400004";

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

/// Monday 2 June 2025.
pub(super) fn today() -> NaiveDate {
    date(2025, 6, 2)
}

pub(super) fn now() -> NaiveDateTime {
    today().and_time(time(8, 0))
}

pub(super) fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(now()))
}

pub(super) fn applicant(n: u32) -> Actor {
    Actor::new(format!("user-{n}"), Role::Applicant)
}

pub(super) fn staff() -> Actor {
    Actor::new("staff-1", Role::Staff)
}

pub(super) fn head() -> Actor {
    Actor::new("kepala-1", Role::HeadOfOffice)
}

pub(super) fn officiant_actor(n: u32) -> Actor {
    Actor::new(format!("penghulu-user-{n}"), Role::Officiant)
}

pub(super) fn officiant(n: u32) -> Officiant {
    Officiant {
        id: OfficiantId(format!("PGH{n:03}")),
        user_id: UserId(format!("penghulu-user-{n}")),
        name: format!("Ustadz Penghulu {n}"),
        status: OfficiantStatus::Active,
        weddings_performed: 40,
        rating: 4.8,
    }
}

pub(super) fn approve() -> ReviewDecision {
    ReviewDecision::Approve { note: None }
}

fn person(nik: &str, name: &str, birthdate: &str, email: &str) -> PersonForm {
    PersonForm {
        nik: nik.to_string(),
        full_name: name.to_string(),
        birthplace: "Banjarmasin".to_string(),
        birthdate: birthdate.to_string(),
        citizenship: "WNI".to_string(),
        passport_number: None,
        religion: "Islam".to_string(),
        education: "S1".to_string(),
        occupation: "Karyawan Swasta".to_string(),
        occupation_description: None,
        marital_status: "Belum Kawin".to_string(),
        address: "Jl. Sultan Adam No. 12, Banjarmasin Utara".to_string(),
        phone: "081234567890".to_string(),
        email: email.to_string(),
    }
}

fn living_parent(name: &str, nik: Option<&str>) -> ParentForm {
    ParentForm {
        presence: "Hidup".to_string(),
        nik: nik.map(str::to_string),
        name: Some(name.to_string()),
        citizenship: Some("WNI".to_string()),
        religion: Some("Islam".to_string()),
        occupation: Some("Wiraswasta".to_string()),
        address: Some("Jl. Pramuka No. 5, Banjarmasin".to_string()),
        ..ParentForm::default()
    }
}

/// Adult couple, bride's father alive and acting as wali, ceremony at the office.
pub(super) fn submission(wedding_date: &str, wedding_time: &str) -> RegistrationSubmission {
    RegistrationSubmission {
        schedule: ScheduleForm {
            wedding_date: wedding_date.to_string(),
            wedding_time: wedding_time.to_string(),
            venue: "Di KUA".to_string(),
            address: None,
            dispensation_number: None,
        },
        groom: person(GROOM_NIK, "Ahmad Fauzi", "1995-01-01", "ahmad@example.com"),
        bride: person(BRIDE_NIK, "Siti Aminah", "1997-01-01", "siti@example.com"),
        groom_father: living_parent("Abdul Hamid", None),
        groom_mother: living_parent("Fatimah", None),
        bride_father: living_parent("Muhammad Yusuf", Some(FATHER_NIK)),
        bride_mother: ParentForm {
            presence: "Meninggal".to_string(),
            ..ParentForm::default()
        },
        guardian: GuardianForm {
            nik: FATHER_NIK.to_string(),
            full_name: "Muhammad Yusuf".to_string(),
            relation: "Ayah Kandung".to_string(),
            life_status: "Hidup".to_string(),
            phone: Some("081298765432".to_string()),
            address: None,
        },
    }
}

pub(super) fn offsite_submission(wedding_date: &str, wedding_time: &str) -> RegistrationSubmission {
    let mut submission = submission(wedding_date, wedding_time);
    submission.schedule.venue = "Di Luar KUA".to_string();
    submission.schedule.address = Some("Jl. Kayu Tangi II No. 8, Banjarmasin".to_string());
    submission
}

/// Wednesday 11 June 2025 session, 08:00 to 12:00.
pub(super) fn session_draft(capacity: Option<u32>) -> SessionDraft {
    SessionDraft {
        date: date(2025, 6, 11),
        start_time: time(8, 0),
        end_time: time(12, 0),
        venue: "Aula KUA Banjarmasin Utara".to_string(),
        counselor: "Dra. Hj. Rahmah".to_string(),
        capacity,
        notes: None,
    }
}

fn profile(nik: &str, name: &str) -> PersonProfile {
    PersonProfile {
        nik: nik.to_string(),
        full_name: name.to_string(),
        birthplace: "Banjarmasin".to_string(),
        birthdate: date(1995, 1, 1),
        citizenship: Citizenship::Indonesian,
        passport_number: None,
        religion: "Islam".to_string(),
        education: "S1".to_string(),
        occupation: "Karyawan Swasta".to_string(),
        occupation_description: None,
        marital_status: MaritalStatus::NeverMarried,
        address: "Jl. Sultan Adam No. 12, Banjarmasin Utara".to_string(),
        phone: "081234567890".to_string(),
        email: "pasangan@example.com".to_string(),
    }
}

/// Stored registration in an arbitrary state, bypassing intake.
pub(super) fn record(
    n: u32,
    wedding_date: NaiveDate,
    wedding_time: NaiveTime,
    status: RegistrationStatus,
    officiant: Option<OfficiantId>,
) -> RegistrationRecord {
    RegistrationRecord {
        id: RegistrationId(format!("seed-{n:03}")),
        number: RegistrationNumber(format!("NKHSEED{n:03}")),
        applicant: UserId(format!("seed-user-{n}")),
        groom: profile(GROOM_NIK, &format!("Calon Suami {n}")),
        bride: profile(BRIDE_NIK, &format!("Calon Istri {n}")),
        parents: Vec::new(),
        guardian: Guardian {
            nik: FATHER_NIK.to_string(),
            full_name: "Muhammad Yusuf".to_string(),
            relation: GuardianRelation::BiologicalFather,
            life_status: LifeStatus::Alive,
            attendance: GuardianAttendance::Unconfirmed,
            phone: None,
            address: None,
        },
        submitted_at: now(),
        wedding_date,
        wedding_time,
        venue: Venue::AtOffice,
        dispensation_number: None,
        status,
        counseling_status: CounselingStatus::NotYet,
        officiant,
        assigned_by: None,
        assigned_at: None,
        notes: None,
        approved_by: None,
        approved_at: None,
        created_at: now(),
        updated_at: now(),
        history: Vec::new(),
    }
}

pub(super) fn build_workflow() -> (
    MarriageWorkflow<MemoryStore, RecordingSink>,
    Arc<MemoryStore>,
    Arc<RecordingSink>,
) {
    let store = Arc::new(MemoryStore::with_officiants([officiant(1), officiant(2)]));
    let sink = Arc::new(RecordingSink::default());
    let workflow = MarriageWorkflow::with_clock(
        store.clone(),
        sink.clone(),
        SchedulingConfig::default(),
        clock(),
    );
    (workflow, store, sink)
}

/// Walks a fresh submission up to `Menunggu Penugasan`.
pub(super) fn ready_for_assignment(
    workflow: &MarriageWorkflow<MemoryStore, RecordingSink>,
    applicant_no: u32,
    wedding_date: &str,
    wedding_time: &str,
) -> RegistrationRecord {
    let owner = applicant(applicant_no);
    let registrations = workflow.registrations();
    let record = registrations
        .submit(&owner, submission(wedding_date, wedding_time))
        .expect("submission accepted");
    registrations
        .review_form(&staff(), &record.id, approve())
        .expect("form approved");
    registrations
        .review_documents(&staff(), &record.id, approve())
        .expect("documents accepted");
    registrations
        .confirm_visit(&owner, &record.id)
        .expect("visit confirmed")
}

/// Continues to `Menunggu Bimbingan` with officiant 1.
pub(super) fn awaiting_counseling(
    workflow: &MarriageWorkflow<MemoryStore, RecordingSink>,
    applicant_no: u32,
    wedding_time: &str,
) -> RegistrationRecord {
    let record = ready_for_assignment(workflow, applicant_no, "2025-06-16", wedding_time);
    let registrations = workflow.registrations();
    registrations
        .assign_officiant(&head(), &record.id, &officiant(1).id)
        .expect("officiant assigned");
    registrations
        .officiant_review(&officiant_actor(1), &record.id, approve())
        .expect("officiant approves")
}

#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) registrations: Mutex<BTreeMap<RegistrationId, RegistrationRecord>>,
    pub(super) officiants: Mutex<HashMap<OfficiantId, Officiant>>,
    pub(super) sessions: Mutex<BTreeMap<SessionId, CounselingSession>>,
    pub(super) enrollments: Mutex<BTreeMap<EnrollmentId, Enrollment>>,
    /// Makes `update_registration` fail with `Unavailable`.
    pub(super) fail_registration_updates: AtomicBool,
    /// Makes `update_enrollment` fail with `Unavailable`.
    pub(super) fail_enrollment_updates: AtomicBool,
}

impl MemoryStore {
    pub(super) fn with_officiants(officiants: impl IntoIterator<Item = Officiant>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.officiants.lock().expect("officiant mutex poisoned");
            for officiant in officiants {
                guard.insert(officiant.id.clone(), officiant);
            }
        }
        store
    }

    pub(super) fn seed(&self, record: RegistrationRecord) {
        self.registrations
            .lock()
            .expect("registration mutex poisoned")
            .insert(record.id.clone(), record);
    }

    pub(super) fn registration(&self, id: &RegistrationId) -> RegistrationRecord {
        self.registrations
            .lock()
            .expect("registration mutex poisoned")
            .get(id)
            .cloned()
            .expect("registration stored")
    }
}

impl RegistrationRepository for MemoryStore {
    fn insert_registration(
        &self,
        record: RegistrationRecord,
    ) -> Result<RegistrationRecord, RepositoryError> {
        let mut guard = self.registrations.lock().expect("registration mutex poisoned");
        let applicant_active = guard
            .values()
            .any(|existing| existing.applicant == record.applicant && existing.is_active());
        if guard.contains_key(&record.id) || (record.is_active() && applicant_active) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update_registration(&self, record: RegistrationRecord) -> Result<(), RepositoryError> {
        if self.fail_registration_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("registrations offline".to_string()));
        }
        let mut guard = self.registrations.lock().expect("registration mutex poisoned");
        if !guard.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch_registration(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<RegistrationRecord>, RepositoryError> {
        let guard = self.registrations.lock().expect("registration mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn active_registration_for(
        &self,
        applicant: &UserId,
    ) -> Result<Option<RegistrationRecord>, RepositoryError> {
        let guard = self.registrations.lock().expect("registration mutex poisoned");
        Ok(guard
            .values()
            .find(|record| &record.applicant == applicant && record.is_active())
            .cloned())
    }

    fn registrations_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<RegistrationRecord>, RepositoryError> {
        self.registrations_between(date, date)
    }

    fn registrations_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RegistrationRecord>, RepositoryError> {
        let guard = self.registrations.lock().expect("registration mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.wedding_date >= start && record.wedding_date <= end)
            .cloned()
            .collect())
    }

    fn set_coordinates(
        &self,
        id: &RegistrationId,
        coordinates: Coordinates,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.registrations.lock().expect("registration mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if let Venue::Offsite {
            coordinates: slot, ..
        } = &mut record.venue
        {
            *slot = Some(coordinates);
        }
        Ok(())
    }
}

impl OfficiantRepository for MemoryStore {
    fn fetch_officiant(&self, id: &OfficiantId) -> Result<Option<Officiant>, RepositoryError> {
        let guard = self.officiants.lock().expect("officiant mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn active_officiants(&self) -> Result<Vec<Officiant>, RepositoryError> {
        let guard = self.officiants.lock().expect("officiant mutex poisoned");
        let mut active: Vec<Officiant> = guard
            .values()
            .filter(|officiant| officiant.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(active)
    }
}

impl CounselingRepository for MemoryStore {
    fn insert_session(
        &self,
        session: CounselingSession,
    ) -> Result<CounselingSession, RepositoryError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update_session(&self, session: CounselingSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch_session(&self, id: &SessionId) -> Result<Option<CounselingSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn sessions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CounselingSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard
            .values()
            .filter(|session| session.date >= start && session.date <= end)
            .cloned()
            .collect())
    }

    fn insert_enrollment(&self, enrollment: Enrollment) -> Result<Enrollment, RepositoryError> {
        let mut guard = self.enrollments.lock().expect("enrollment mutex poisoned");
        let duplicate = guard.values().any(|existing| {
            existing.session == enrollment.session && existing.registration == enrollment.registration
        });
        if duplicate || guard.contains_key(&enrollment.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(enrollment.id.clone(), enrollment.clone());
        Ok(enrollment)
    }

    fn update_enrollment(&self, enrollment: Enrollment) -> Result<(), RepositoryError> {
        if self.fail_enrollment_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("enrollments offline".to_string()));
        }
        let mut guard = self.enrollments.lock().expect("enrollment mutex poisoned");
        guard.insert(enrollment.id.clone(), enrollment);
        Ok(())
    }

    fn fetch_enrollment(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, RepositoryError> {
        let guard = self.enrollments.lock().expect("enrollment mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn enrollments_for_session(&self, id: &SessionId) -> Result<Vec<Enrollment>, RepositoryError> {
        let guard = self.enrollments.lock().expect("enrollment mutex poisoned");
        Ok(guard
            .values()
            .filter(|enrollment| &enrollment.session == id)
            .cloned()
            .collect())
    }

    fn enrollment_for_registration(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let guard = self.enrollments.lock().expect("enrollment mutex poisoned");
        Ok(guard
            .values()
            .filter(|enrollment| &enrollment.registration == id)
            .max_by_key(|enrollment| enrollment.enrolled_at)
            .cloned())
    }
}

#[derive(Default)]
pub(super) struct RecordingSink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingSink {
    pub(super) fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().expect("sink mutex poisoned").clone()
    }

    pub(super) fn sent_to(&self, recipient: &Recipient) -> Vec<NotificationEvent> {
        self.events()
            .into_iter()
            .filter(|event| &event.recipient == recipient)
            .collect()
    }

    pub(super) fn clear(&self) {
        self.events.lock().expect("sink mutex poisoned").clear();
    }
}

impl NotificationSink for RecordingSink {
    fn enqueue(&self, event: NotificationEvent) -> Result<(), NotificationError> {
        self.events.lock().expect("sink mutex poisoned").push(event);
        Ok(())
    }
}

/// Outbox whose worker has gone away.
pub(super) struct ClosedSink;

impl NotificationSink for ClosedSink {
    fn enqueue(&self, _event: NotificationEvent) -> Result<(), NotificationError> {
        Err(NotificationError::Closed)
    }
}

pub(super) struct UnavailableStore;

impl RegistrationRepository for UnavailableStore {
    fn insert_registration(
        &self,
        _record: RegistrationRecord,
    ) -> Result<RegistrationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_registration(&self, _record: RegistrationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_registration(
        &self,
        _id: &RegistrationId,
    ) -> Result<Option<RegistrationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn active_registration_for(
        &self,
        _applicant: &UserId,
    ) -> Result<Option<RegistrationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn registrations_on(
        &self,
        _date: NaiveDate,
    ) -> Result<Vec<RegistrationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn registrations_between(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<RegistrationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn set_coordinates(
        &self,
        _id: &RegistrationId,
        _coordinates: Coordinates,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl OfficiantRepository for UnavailableStore {
    fn fetch_officiant(&self, _id: &OfficiantId) -> Result<Option<Officiant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn active_officiants(&self) -> Result<Vec<Officiant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl CounselingRepository for UnavailableStore {
    fn insert_session(
        &self,
        _session: CounselingSession,
    ) -> Result<CounselingSession, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_session(&self, _session: CounselingSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_session(&self, _id: &SessionId) -> Result<Option<CounselingSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn sessions_between(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<CounselingSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_enrollment(&self, _enrollment: Enrollment) -> Result<Enrollment, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_enrollment(&self, _enrollment: Enrollment) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_enrollment(&self, _id: &EnrollmentId) -> Result<Option<Enrollment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn enrollments_for_session(&self, _id: &SessionId) -> Result<Vec<Enrollment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn enrollment_for_registration(
        &self,
        _id: &RegistrationId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

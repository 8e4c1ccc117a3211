use chrono::NaiveDate;
use kua_registry::workflows::marriage::counseling::EnrollmentId;
use kua_registry::workflows::marriage::domain::{Coordinates, OfficiantStatus, Venue};
use kua_registry::workflows::marriage::{
    CounselingRepository, CounselingSession, Enrollment, GeocodeError, Geocoder,
    NotificationError, NotificationEvent, NotificationPublisher, Officiant, OfficiantId,
    OfficiantRepository, RegistrationId, RegistrationRecord, RegistrationRepository,
    RepositoryError, SessionId, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local store backing the service until a database adapter lands.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRegistryStore {
    registrations: Arc<Mutex<BTreeMap<RegistrationId, RegistrationRecord>>>,
    officiants: Arc<Mutex<BTreeMap<OfficiantId, Officiant>>>,
    sessions: Arc<Mutex<BTreeMap<SessionId, CounselingSession>>>,
    enrollments: Arc<Mutex<BTreeMap<EnrollmentId, Enrollment>>>,
}

impl InMemoryRegistryStore {
    pub(crate) fn with_officiants(officiants: impl IntoIterator<Item = Officiant>) -> Self {
        let store = Self::default();
        locked(&store.officiants).extend(
            officiants
                .into_iter()
                .map(|officiant| (officiant.id.clone(), officiant)),
        );
        store
    }
}

impl RegistrationRepository for InMemoryRegistryStore {
    fn insert_registration(
        &self,
        record: RegistrationRecord,
    ) -> Result<RegistrationRecord, RepositoryError> {
        let mut guard = locked(&self.registrations);
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
        let mut guard = locked(&self.registrations);
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_registration(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<RegistrationRecord>, RepositoryError> {
        Ok(locked(&self.registrations).get(id).cloned())
    }

    fn active_registration_for(
        &self,
        applicant: &UserId,
    ) -> Result<Option<RegistrationRecord>, RepositoryError> {
        Ok(locked(&self.registrations)
            .values()
            .find(|record| &record.applicant == applicant && record.is_active())
            .cloned())
    }

    fn registrations_on(&self, date: NaiveDate) -> Result<Vec<RegistrationRecord>, RepositoryError> {
        self.registrations_between(date, date)
    }

    fn registrations_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RegistrationRecord>, RepositoryError> {
        Ok(locked(&self.registrations)
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
        let mut guard = locked(&self.registrations);
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

impl OfficiantRepository for InMemoryRegistryStore {
    fn fetch_officiant(&self, id: &OfficiantId) -> Result<Option<Officiant>, RepositoryError> {
        Ok(locked(&self.officiants).get(id).cloned())
    }

    fn active_officiants(&self) -> Result<Vec<Officiant>, RepositoryError> {
        Ok(locked(&self.officiants)
            .values()
            .filter(|officiant| officiant.is_active())
            .cloned()
            .collect())
    }
}

impl CounselingRepository for InMemoryRegistryStore {
    fn insert_session(
        &self,
        session: CounselingSession,
    ) -> Result<CounselingSession, RepositoryError> {
        let mut guard = locked(&self.sessions);
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update_session(&self, session: CounselingSession) -> Result<(), RepositoryError> {
        let mut guard = locked(&self.sessions);
        if !guard.contains_key(&session.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch_session(&self, id: &SessionId) -> Result<Option<CounselingSession>, RepositoryError> {
        Ok(locked(&self.sessions).get(id).cloned())
    }

    fn sessions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CounselingSession>, RepositoryError> {
        Ok(locked(&self.sessions)
            .values()
            .filter(|session| session.date >= start && session.date <= end)
            .cloned()
            .collect())
    }

    fn insert_enrollment(&self, enrollment: Enrollment) -> Result<Enrollment, RepositoryError> {
        let mut guard = locked(&self.enrollments);
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
        let mut guard = locked(&self.enrollments);
        if !guard.contains_key(&enrollment.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(enrollment.id.clone(), enrollment);
        Ok(())
    }

    fn fetch_enrollment(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, RepositoryError> {
        Ok(locked(&self.enrollments).get(id).cloned())
    }

    fn enrollments_for_session(&self, id: &SessionId) -> Result<Vec<Enrollment>, RepositoryError> {
        Ok(locked(&self.enrollments)
            .values()
            .filter(|enrollment| &enrollment.session == id)
            .cloned()
            .collect())
    }

    fn enrollment_for_registration(
        &self,
        id: &RegistrationId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        Ok(locked(&self.enrollments)
            .values()
            .filter(|enrollment| &enrollment.registration == id)
            .max_by_key(|enrollment| enrollment.enrolled_at)
            .cloned())
    }
}

/// Writes every notification to the log; stands in for the in-app inbox.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggingPublisher;

impl NotificationPublisher for LoggingPublisher {
    fn deliver(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        info!(
            kind = ?event.kind,
            recipient = ?event.recipient,
            title = %event.title,
            body = %event.message,
            "notification"
        );
        Ok(())
    }
}

/// Offline gazetteer of well-known streets in Banjarmasin.
#[derive(Debug, Clone)]
pub(crate) struct DirectoryGeocoder {
    streets: HashMap<String, Coordinates>,
}

impl DirectoryGeocoder {
    pub(crate) fn banjarmasin() -> Self {
        let streets = [
            ("jl. kayu tangi", -3.2953, 114.5872),
            ("jl. sultan adam", -3.2985, 114.5986),
            ("jl. pramuka", -3.3166, 114.6141),
            ("jl. ahmad yani", -3.3274, 114.6101),
            ("jl. brigjen hasan basri", -3.2980, 114.5838),
            ("jl. lambung mangkurat", -3.3193, 114.5910),
        ]
        .into_iter()
        .map(|(street, latitude, longitude)| {
            (
                street.to_string(),
                Coordinates {
                    latitude,
                    longitude,
                },
            )
        })
        .collect();
        Self { streets }
    }
}

impl Geocoder for DirectoryGeocoder {
    fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let needle = address.trim().to_lowercase();
        self.streets
            .iter()
            .filter(|(street, _)| needle.starts_with(street.as_str()))
            .max_by_key(|(street, _)| street.len())
            .map(|(_, coordinates)| *coordinates)
            .ok_or_else(|| GeocodeError::NotFound {
                address: address.to_string(),
            })
    }
}

/// Officiants on the office roster at start-up.
pub(crate) fn seeded_officiants() -> Vec<Officiant> {
    [
        ("PGH001", "penghulu-1", "H. Ahmad Syarifuddin, S.Ag", 128, 4.9),
        ("PGH002", "penghulu-2", "H. Muhammad Ridwan, M.H.I", 96, 4.8),
        ("PGH003", "penghulu-3", "Drs. H. Abdul Kadir", 143, 4.7),
    ]
    .into_iter()
    .map(|(id, user, name, performed, rating)| Officiant {
        id: OfficiantId(id.to_string()),
        user_id: UserId(user.to_string()),
        name: name.to_string(),
        status: OfficiantStatus::Active,
        weddings_performed: performed,
        rating,
    })
    .collect()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

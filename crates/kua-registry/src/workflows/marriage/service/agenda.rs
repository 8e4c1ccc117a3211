use std::sync::Arc;

use chrono::NaiveDate;

use super::WorkflowError;
use crate::workflows::marriage::agenda::{
    self, AgendaError, CounselingMonth, WeddingDayDetail, WeddingMonth,
};
use crate::workflows::marriage::calendar::{month_bounds, Clock};
use crate::workflows::marriage::domain::OfficiantId;
use crate::workflows::marriage::repository::RegistryStore;
use crate::workflows::marriage::scheduling::{
    ConflictDetector, OfficiantAvailability, OfficiantDaySchedule, SchedulingConfig,
};

/// Read-only calendar and officiant load views.
pub struct AgendaService<S> {
    store: Arc<S>,
    detector: ConflictDetector,
    clock: Arc<dyn Clock>,
}

impl<S> AgendaService<S>
where
    S: RegistryStore + 'static,
{
    pub fn new(store: Arc<S>, config: SchedulingConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            detector: ConflictDetector::new(config),
            clock,
        }
    }

    fn bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), WorkflowError> {
        month_bounds(year, month).ok_or_else(|| AgendaError::InvalidMonth { year, month }.into())
    }

    pub fn wedding_month(&self, year: i32, month: u32) -> Result<WeddingMonth, WorkflowError> {
        let (first, last) = Self::bounds(year, month)?;
        let registrations = self.store.registrations_between(first, last)?;
        Ok(agenda::wedding_month(
            year,
            month,
            self.clock.today(),
            &registrations,
            self.detector.config().venue_daily_capacity,
        )?)
    }

    pub fn wedding_day(&self, date: NaiveDate) -> Result<WeddingDayDetail, WorkflowError> {
        let registrations = self.store.registrations_on(date)?;
        Ok(agenda::wedding_day(
            date,
            &registrations,
            self.detector.config().venue_daily_capacity,
        ))
    }

    pub fn counseling_month(&self, year: i32, month: u32) -> Result<CounselingMonth, WorkflowError> {
        let (first, last) = Self::bounds(year, month)?;
        let mut sessions = Vec::new();
        for session in self.store.sessions_between(first, last)? {
            let enrolled = self.store.enrollments_for_session(&session.id)?.len();
            sessions.push((session, enrolled));
        }
        Ok(agenda::counseling_month(
            year,
            month,
            self.clock.today(),
            &sessions,
        )?)
    }

    pub fn officiant_slots(
        &self,
        officiant: &OfficiantId,
        date: NaiveDate,
    ) -> Result<OfficiantAvailability, WorkflowError> {
        if self.store.fetch_officiant(officiant)?.is_none() {
            return Err(WorkflowError::not_found("officiant", officiant));
        }
        let day = self.store.registrations_on(date)?;
        Ok(self.detector.availability(officiant, date, &day))
    }

    /// Load of every active officiant on `date`.
    pub fn officiant_schedules(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<OfficiantDaySchedule>, WorkflowError> {
        let day = self.store.registrations_on(date)?;
        Ok(self
            .store
            .active_officiants()?
            .iter()
            .map(|officiant| self.detector.day_schedule(officiant, date, &day))
            .collect())
    }
}

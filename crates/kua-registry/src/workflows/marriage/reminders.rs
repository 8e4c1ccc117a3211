//! Daily "tomorrow" reminders for weddings and counseling sessions.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{info, warn};

use super::calendar::Clock;
use super::counseling::SessionId;
use super::domain::{RegistrationId, RegistrationStatus};
use super::notices;
use super::notifications::{NotificationEvent, NotificationSink, Recipient};
use super::repository::{RegistryStore, RepositoryError};

/// Statuses whose weddings are still expected to take place.
pub const REMINDER_STATUSES: [RegistrationStatus; 3] = [
    RegistrationStatus::AwaitingOfficiantVerification,
    RegistrationStatus::AwaitingCounseling,
    RegistrationStatus::CounselingDone,
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReminderKey {
    Wedding(RegistrationId),
    Counseling(SessionId, RegistrationId),
}

/// Reminders already emitted, keyed by subject and event date.
#[derive(Debug, Default)]
pub struct ReminderLedger {
    sent: Mutex<HashSet<(ReminderKey, NaiveDate)>>,
}

impl ReminderLedger {
    /// `true` when this is the first time the reminder is recorded.
    pub fn mark(&self, key: ReminderKey, date: NaiveDate) -> bool {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((key, date))
    }

    pub fn forget(&self, key: &ReminderKey, date: NaiveDate) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(key.clone(), date));
    }

    /// Drops entries for events dated before `date`.
    pub fn prune_before(&self, date: NaiveDate) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, sent_for)| *sent_for >= date);
    }

    pub fn len(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub date: Option<NaiveDate>,
    pub weddings: usize,
    pub counseling: usize,
    pub already_sent: usize,
    pub failed: usize,
}

pub struct ReminderScanner<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    ledger: ReminderLedger,
}

impl<S, N> ReminderScanner<S, N>
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
            ledger: ReminderLedger::default(),
        }
    }

    pub fn ledger(&self) -> &ReminderLedger {
        &self.ledger
    }

    /// Emits reminders for events on the day after `today`. Safe to call repeatedly.
    pub fn run_for(&self, today: NaiveDate) -> Result<ReminderReport, RepositoryError> {
        self.ledger.prune_before(today);
        let tomorrow = today + Duration::days(1);
        let mut report = ReminderReport {
            date: Some(tomorrow),
            ..ReminderReport::default()
        };

        for record in self.store.registrations_on(tomorrow)? {
            if !REMINDER_STATUSES.contains(&record.status) {
                continue;
            }
            let key = ReminderKey::Wedding(record.id.clone());
            if self.dispatch(key, tomorrow, notices::wedding_reminder(&record), &mut report) {
                report.weddings += 1;
            }
        }

        for session in self.store.sessions_between(tomorrow, tomorrow)? {
            if !session.is_active() {
                continue;
            }
            for enrollment in self.store.enrollments_for_session(&session.id)? {
                let key = ReminderKey::Counseling(session.id.clone(), enrollment.registration);
                let event =
                    notices::counseling_reminder(&session, Recipient::User(enrollment.applicant));
                if self.dispatch(key, tomorrow, event, &mut report) {
                    report.counseling += 1;
                }
            }
        }

        info!(
            date = %tomorrow,
            weddings = report.weddings,
            counseling = report.counseling,
            already_sent = report.already_sent,
            "reminder scan finished"
        );
        Ok(report)
    }

    fn dispatch(
        &self,
        key: ReminderKey,
        date: NaiveDate,
        event: NotificationEvent,
        report: &mut ReminderReport,
    ) -> bool {
        if !self.ledger.mark(key.clone(), date) {
            report.already_sent += 1;
            return false;
        }
        match self.notifier.enqueue(event) {
            Ok(()) => true,
            Err(error) => {
                // Unmarked so the next run retries it.
                self.ledger.forget(&key, date);
                report.failed += 1;
                warn!(?key, %error, "failed to enqueue reminder");
                false
            }
        }
    }

    /// Sleeps until each daily trigger and runs the scan; never returns.
    pub async fn run_daily(self: Arc<Self>, at: NaiveTime) {
        loop {
            let now = self.clock.now();
            let next = next_run_after(now, at);
            let wait = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);
            info!(next_run = %next, "reminder scan scheduled");
            tokio::time::sleep(wait).await;

            if let Err(error) = self.run_for(next.date()) {
                warn!(%error, "reminder scan failed");
            }
        }
    }
}

/// The next instant at `at` strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

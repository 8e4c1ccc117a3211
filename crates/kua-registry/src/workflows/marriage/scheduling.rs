use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;

use super::calendar::{clock_time, format_clock_time, minutes_apart};
use super::domain::{
    Officiant, OfficiantId, RegistrationId, RegistrationNumber, RegistrationRecord,
};

/// Capacity numbers and separation windows for officiant scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingConfig {
    /// Office-venue ceremonies per day.
    pub venue_daily_capacity: u32,
    pub officiant_daily_quota: u32,
    pub assignment_separation_minutes: i64,
    pub change_separation_minutes: i64,
    pub first_slot: NaiveTime,
    pub slot_count: u32,
    pub slot_separation_minutes: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            venue_daily_capacity: 9,
            officiant_daily_quota: 3,
            assignment_separation_minutes: 60,
            change_separation_minutes: 120,
            first_slot: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_count: 9,
            slot_separation_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleConflict {
    #[error("daily wedding quota at the office is full on {date} ({scheduled}/{capacity})")]
    VenueFull {
        date: NaiveDate,
        capacity: u32,
        scheduled: u32,
    },
    #[error("officiant {officiant} already officiates {conflicting} at {conflicting_time} on {date}; ceremonies must be at least {window_minutes} minutes apart")]
    OfficiantBusy {
        officiant: OfficiantId,
        date: NaiveDate,
        conflicting: RegistrationNumber,
        conflicting_time: String,
        window_minutes: i64,
    },
    #[error("officiant {officiant} already has {scheduled} ceremonies on {date} (daily quota {quota})")]
    OfficiantQuotaReached {
        officiant: OfficiantId,
        date: NaiveDate,
        quota: u32,
        scheduled: u32,
    },
    #[error("officiant {officiant} is already assigned to this registration")]
    SameOfficiant { officiant: OfficiantId },
    #[error("registration has no officiant to replace")]
    NoCurrentOfficiant,
    #[error("officiant {officiant} is not active")]
    OfficiantInactive { officiant: OfficiantId },
}

/// Result of a successful conflict check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentCheck {
    /// Officiant's ceremonies that day once this one is added.
    pub officiant_day_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    #[serde(with = "clock_time")]
    pub start: NaiveTime,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting: Option<RegistrationNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficiantAvailability {
    pub officiant: OfficiantId,
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
    pub scheduled: u32,
    pub daily_quota: u32,
    pub remaining_quota: u32,
    pub fully_booked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    #[serde(rename = "Penuh")]
    Full,
    #[serde(rename = "Sebagian")]
    Partial,
    #[serde(rename = "Kosong")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledCeremony {
    pub registration_id: RegistrationId,
    pub number: RegistrationNumber,
    pub time: String,
    pub venue: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficiantDaySchedule {
    pub officiant: OfficiantId,
    pub name: String,
    pub ceremonies: Vec<ScheduledCeremony>,
    pub scheduled: u32,
    pub remaining_quota: u32,
    pub load: LoadStatus,
}

/// Venue capacity, officiant quota, and minimum-separation rules over one day's registrations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector {
    config: SchedulingConfig,
}

impl ConflictDetector {
    pub fn new(config: SchedulingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Ceremonies the officiant already holds on `date`, ordered by time.
    pub fn officiant_ceremonies<'a>(
        &self,
        officiant: &OfficiantId,
        date: NaiveDate,
        day: &'a [RegistrationRecord],
        exclude: Option<&RegistrationId>,
    ) -> Vec<&'a RegistrationRecord> {
        let mut held: Vec<&RegistrationRecord> = day
            .iter()
            .filter(|record| record.wedding_date == date)
            .filter(|record| record.status.holds_schedule())
            .filter(|record| record.officiant.as_ref() == Some(officiant))
            .filter(|record| Some(&record.id) != exclude)
            .collect();
        held.sort_by_key(|record| record.wedding_time);
        held
    }

    /// Office-venue ceremonies already committed on `date`.
    pub fn office_bookings(&self, date: NaiveDate, day: &[RegistrationRecord]) -> u32 {
        day.iter()
            .filter(|record| record.wedding_date == date)
            .filter(|record| record.venue.is_office() && record.status.holds_schedule())
            .count() as u32
    }

    pub fn check_assignment(
        &self,
        target: &RegistrationRecord,
        officiant: &OfficiantId,
        day: &[RegistrationRecord],
    ) -> Result<AssignmentCheck, ScheduleConflict> {
        let date = target.wedding_date;
        if target.venue.is_office() {
            let others: Vec<RegistrationRecord> = day
                .iter()
                .filter(|record| record.id != target.id)
                .cloned()
                .collect();
            let scheduled = self.office_bookings(date, &others);
            if scheduled >= self.config.venue_daily_capacity {
                return Err(ScheduleConflict::VenueFull {
                    date,
                    capacity: self.config.venue_daily_capacity,
                    scheduled,
                });
            }
        }

        let held = self.officiant_ceremonies(officiant, date, day, Some(&target.id));
        self.check_window(
            target,
            officiant,
            &held,
            self.config.assignment_separation_minutes,
        )?;

        Ok(self.projected(held.len() as u32 + 1, date))
    }

    /// Stricter variant used when replacing an officiant: the daily quota is a hard limit.
    pub fn check_change(
        &self,
        target: &RegistrationRecord,
        officiant: &OfficiantId,
        day: &[RegistrationRecord],
    ) -> Result<AssignmentCheck, ScheduleConflict> {
        let date = target.wedding_date;
        match target.officiant.as_ref() {
            None => return Err(ScheduleConflict::NoCurrentOfficiant),
            Some(current) if current == officiant => {
                return Err(ScheduleConflict::SameOfficiant {
                    officiant: officiant.clone(),
                })
            }
            Some(_) => {}
        }

        let held = self.officiant_ceremonies(officiant, date, day, Some(&target.id));
        let scheduled = held.len() as u32;
        if scheduled >= self.config.officiant_daily_quota {
            return Err(ScheduleConflict::OfficiantQuotaReached {
                officiant: officiant.clone(),
                date,
                quota: self.config.officiant_daily_quota,
                scheduled,
            });
        }

        self.check_window(
            target,
            officiant,
            &held,
            self.config.change_separation_minutes,
        )?;

        Ok(self.projected(scheduled + 1, date))
    }

    fn check_window(
        &self,
        target: &RegistrationRecord,
        officiant: &OfficiantId,
        held: &[&RegistrationRecord],
        window_minutes: i64,
    ) -> Result<(), ScheduleConflict> {
        let clash = held
            .iter()
            .find(|record| minutes_apart(record.wedding_time, target.wedding_time) < window_minutes);

        match clash {
            Some(record) => Err(ScheduleConflict::OfficiantBusy {
                officiant: officiant.clone(),
                date: target.wedding_date,
                conflicting: record.number.clone(),
                conflicting_time: format_clock_time(record.wedding_time),
                window_minutes,
            }),
            None => Ok(()),
        }
    }

    fn projected(&self, officiant_day_count: u32, date: NaiveDate) -> AssignmentCheck {
        let warning = (officiant_day_count >= self.config.officiant_daily_quota).then(|| {
            format!(
                "Peringatan: penghulu ini memiliki {officiant_day_count} jadwal pada tanggal {date}"
            )
        });
        AssignmentCheck {
            officiant_day_count,
            warning,
        }
    }

    pub fn slot_starts(&self) -> Vec<NaiveTime> {
        (0..self.config.slot_count)
            .map(|idx| self.config.first_slot + Duration::hours(i64::from(idx)))
            .collect()
    }

    pub fn availability(
        &self,
        officiant: &OfficiantId,
        date: NaiveDate,
        day: &[RegistrationRecord],
    ) -> OfficiantAvailability {
        let held = self.officiant_ceremonies(officiant, date, day, None);
        let slots = self
            .slot_starts()
            .into_iter()
            .map(|start| {
                let conflicting = held
                    .iter()
                    .find(|record| {
                        minutes_apart(record.wedding_time, start)
                            < self.config.slot_separation_minutes
                    })
                    .map(|record| record.number.clone());
                TimeSlot {
                    start,
                    available: conflicting.is_none(),
                    conflicting,
                }
            })
            .collect();

        let scheduled = held.len() as u32;
        let quota = self.config.officiant_daily_quota;
        OfficiantAvailability {
            officiant: officiant.clone(),
            date,
            slots,
            scheduled,
            daily_quota: quota,
            remaining_quota: quota.saturating_sub(scheduled),
            fully_booked: scheduled >= quota,
        }
    }

    pub fn day_schedule(
        &self,
        officiant: &Officiant,
        date: NaiveDate,
        day: &[RegistrationRecord],
    ) -> OfficiantDaySchedule {
        let held = self.officiant_ceremonies(&officiant.id, date, day, None);
        let scheduled = held.len() as u32;
        let quota = self.config.officiant_daily_quota;
        let load = if scheduled >= quota {
            LoadStatus::Full
        } else if scheduled > 0 {
            LoadStatus::Partial
        } else {
            LoadStatus::Empty
        };

        OfficiantDaySchedule {
            officiant: officiant.id.clone(),
            name: officiant.name.clone(),
            ceremonies: held
                .iter()
                .map(|record| ScheduledCeremony {
                    registration_id: record.id.clone(),
                    number: record.number.clone(),
                    time: format_clock_time(record.wedding_time),
                    venue: record.venue.kind().label(),
                    status: record.status.label(),
                })
                .collect(),
            scheduled,
            remaining_quota: quota.saturating_sub(scheduled),
            load,
        }
    }
}

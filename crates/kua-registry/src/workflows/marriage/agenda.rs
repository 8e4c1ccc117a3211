//! Month and day views over stored registrations and counseling sessions.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::calendar::{format_clock_time, is_wednesday, month_bounds};
use super::counseling::{CounselingSession, SessionId};
use super::domain::{
    OfficiantId, RegistrationId, RegistrationNumber, RegistrationRecord, RegistrationStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgendaError {
    #[error("{year}-{month} is not a valid calendar month")]
    InvalidMonth { year: i32, month: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayColor {
    #[serde(rename = "hijau")]
    Green,
    #[serde(rename = "kuning")]
    Yellow,
}

impl DayColor {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Green => "hijau",
            Self::Yellow => "kuning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WeddingDayStatus {
    #[serde(rename = "Terlewat")]
    Past,
    #[serde(rename = "Penuh")]
    Full,
    #[serde(rename = "Tersedia")]
    Available,
}

impl WeddingDayStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Past => "Terlewat",
            Self::Full => "Penuh",
            Self::Available => "Tersedia",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeddingDay {
    pub date: NaiveDate,
    pub status: WeddingDayStatus,
    pub available: bool,
    pub total: u32,
    pub at_office: u32,
    pub offsite: u32,
    pub settled: u32,
    pub in_review: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<DayColor>,
    pub remaining_office_quota: u32,
    pub office_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeddingMonth {
    pub year: i32,
    pub month: u32,
    pub days: Vec<WeddingDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeddingEntry {
    pub registration_id: RegistrationId,
    pub number: RegistrationNumber,
    pub time: String,
    pub venue: &'static str,
    pub address: String,
    pub status: &'static str,
    pub groom: String,
    pub bride: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officiant: Option<OfficiantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeddingDayDetail {
    pub date: NaiveDate,
    pub weddings: Vec<WeddingEntry>,
    pub at_office: u32,
    pub remaining_office_quota: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CounselingDayStatus {
    #[serde(rename = "Terlewat")]
    Past,
    #[serde(rename = "Belum Dijadwalkan")]
    NotScheduled,
    #[serde(rename = "Bukan Hari Rabu")]
    NotWednesday,
    #[serde(rename = "Penuh")]
    Full,
    #[serde(rename = "Tersedia")]
    Available,
}

impl CounselingDayStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Past => "Terlewat",
            Self::NotScheduled => "Belum Dijadwalkan",
            Self::NotWednesday => "Bukan Hari Rabu",
            Self::Full => "Penuh",
            Self::Available => "Tersedia",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub start_time: String,
    pub end_time: String,
    pub venue: String,
    pub counselor: String,
    pub capacity: u32,
    pub enrolled: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounselingDay {
    pub date: NaiveDate,
    pub status: CounselingDayStatus,
    pub available: bool,
    pub remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounselingMonth {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CounselingDay>,
}

/// Rejected registrations no longer occupy the calendar.
fn on_calendar(record: &RegistrationRecord) -> bool {
    record.status != RegistrationStatus::Rejected
}

/// Documents handed in or anything later.
fn is_settled(status: RegistrationStatus) -> bool {
    status >= RegistrationStatus::DocumentsReceived && status != RegistrationStatus::Rejected
}

fn days_of(year: i32, month: u32) -> Result<Vec<NaiveDate>, AgendaError> {
    let (first, last) =
        month_bounds(year, month).ok_or(AgendaError::InvalidMonth { year, month })?;
    Ok(first.iter_days().take_while(|day| *day <= last).collect())
}

pub fn wedding_month(
    year: i32,
    month: u32,
    today: NaiveDate,
    registrations: &[RegistrationRecord],
    office_capacity: u32,
) -> Result<WeddingMonth, AgendaError> {
    let days = days_of(year, month)?
        .into_iter()
        .map(|date| {
            let scheduled: Vec<&RegistrationRecord> = registrations
                .iter()
                .filter(|record| record.wedding_date == date && on_calendar(record))
                .collect();
            let at_office = scheduled
                .iter()
                .filter(|record| record.venue.is_office())
                .count() as u32;
            let total = scheduled.len() as u32;
            let settled = scheduled
                .iter()
                .filter(|record| is_settled(record.status))
                .count() as u32;
            let in_review = total - settled;

            let color = if settled > 0 {
                Some(DayColor::Green)
            } else if in_review > 0 {
                Some(DayColor::Yellow)
            } else {
                None
            };

            let (status, remaining) = if date < today {
                (WeddingDayStatus::Past, 0)
            } else if at_office >= office_capacity {
                (WeddingDayStatus::Full, 0)
            } else {
                (WeddingDayStatus::Available, office_capacity - at_office)
            };

            WeddingDay {
                date,
                status,
                available: status == WeddingDayStatus::Available,
                total,
                at_office,
                offsite: total - at_office,
                settled,
                in_review,
                color,
                remaining_office_quota: remaining,
                office_capacity,
            }
        })
        .collect();

    Ok(WeddingMonth { year, month, days })
}

pub fn wedding_day(
    date: NaiveDate,
    registrations: &[RegistrationRecord],
    office_capacity: u32,
) -> WeddingDayDetail {
    let mut scheduled: Vec<&RegistrationRecord> = registrations
        .iter()
        .filter(|record| record.wedding_date == date && on_calendar(record))
        .collect();
    scheduled.sort_by_key(|record| record.wedding_time);

    let at_office = scheduled
        .iter()
        .filter(|record| record.venue.is_office())
        .count() as u32;

    WeddingDayDetail {
        date,
        weddings: scheduled
            .into_iter()
            .map(|record| WeddingEntry {
                registration_id: record.id.clone(),
                number: record.number.clone(),
                time: format_clock_time(record.wedding_time),
                venue: record.venue.kind().label(),
                address: record.venue.address().to_string(),
                status: record.status.label(),
                groom: record.groom.full_name.clone(),
                bride: record.bride.full_name.clone(),
                officiant: record.officiant.clone(),
            })
            .collect(),
        at_office,
        remaining_office_quota: office_capacity.saturating_sub(at_office),
    }
}

/// `sessions` pairs each session with its current enrollment count. Cancelled and
/// completed sessions are ignored.
pub fn counseling_month(
    year: i32,
    month: u32,
    today: NaiveDate,
    sessions: &[(CounselingSession, usize)],
) -> Result<CounselingMonth, AgendaError> {
    let days = days_of(year, month)?
        .into_iter()
        .map(|date| {
            let booked = sessions
                .iter()
                .find(|(session, _)| session.date == date && session.is_active());

            let (status, remaining, session) = match booked {
                _ if date < today => (CounselingDayStatus::Past, 0, None),
                None if is_wednesday(date) => (CounselingDayStatus::NotScheduled, 0, None),
                None => (CounselingDayStatus::NotWednesday, 0, None),
                Some((session, enrolled)) => {
                    let remaining = session.remaining_capacity(*enrolled);
                    let status = if remaining == 0 {
                        CounselingDayStatus::Full
                    } else {
                        CounselingDayStatus::Available
                    };
                    (status, remaining, Some(summarize(session, *enrolled)))
                }
            };

            CounselingDay {
                date,
                status,
                available: status == CounselingDayStatus::Available,
                remaining,
                session,
            }
        })
        .collect();

    Ok(CounselingMonth { year, month, days })
}

fn summarize(session: &CounselingSession, enrolled: usize) -> SessionSummary {
    SessionSummary {
        id: session.id.clone(),
        start_time: format_clock_time(session.start_time),
        end_time: format_clock_time(session.end_time),
        venue: session.venue.clone(),
        counselor: session.counselor.clone(),
        capacity: session.capacity,
        enrolled: enrolled as u32,
    }
}

impl WeddingMonth {
    pub fn day(&self, day: u32) -> Option<&WeddingDay> {
        self.days.iter().find(|entry| entry.date.day() == day)
    }
}

impl CounselingMonth {
    pub fn day(&self, day: u32) -> Option<&CounselingDay> {
        self.days.iter().find(|entry| entry.date.day() == day)
    }
}

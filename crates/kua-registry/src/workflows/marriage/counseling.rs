//! Pre-marriage counseling (bimbingan perkawinan) sessions and enrollments.
//!
//! Sessions only run on Wednesdays, at most one active session per date, and each
//! registration can hold one seat per session.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::calendar::{
    clock_time, deserialize_date, format_clock_time, is_wednesday, optional_clock_time,
};
use super::domain::{RegistrationId, RegistrationNumber, RegistrationStatus, UserId};

pub const DEFAULT_CAPACITY: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnrollmentId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    #[serde(rename = "Aktif")]
    Active,
    #[serde(rename = "Selesai")]
    Completed,
    #[serde(rename = "Dibatalkan")]
    Cancelled,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Aktif",
            Self::Completed => "Selesai",
            Self::Cancelled => "Dibatalkan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounselingSession {
    pub id: SessionId,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    pub venue: String,
    pub counselor: String,
    pub capacity: u32,
    pub status: SessionStatus,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CounselingSession {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn remaining_capacity(&self, enrolled: usize) -> u32 {
        self.capacity.saturating_sub(enrolled as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "Belum")]
    NotYet,
    #[serde(rename = "Hadir")]
    Present,
    #[serde(rename = "Tidak Hadir")]
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateStatus {
    #[serde(rename = "Belum")]
    NotIssued,
    #[serde(rename = "Sudah")]
    Issued,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub session: SessionId,
    pub registration: RegistrationId,
    pub applicant: UserId,
    pub enrolled_at: NaiveDateTime,
    pub attendance: AttendanceStatus,
    pub certificate: CertificateStatus,
    pub certificate_number: Option<String>,
}

/// Payload for scheduling a new session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionDraft {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    pub venue: String,
    pub counselor: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionUpdate {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_clock_time::deserialize")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "optional_clock_time::deserialize")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub counselor: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttendanceUpdate {
    pub attendance: AttendanceStatus,
    pub certificate: CertificateStatus,
    #[serde(default)]
    pub certificate_number: Option<String>,
}

/// Enrollment joined with the registration number for the participant list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub enrollment: EnrollmentId,
    pub registration: RegistrationId,
    pub number: RegistrationNumber,
    pub attendance: AttendanceStatus,
    pub certificate: CertificateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CounselingViolation {
    #[error("counseling sessions can only be held on Wednesday ({date} is not)")]
    NotWednesday { date: NaiveDate },
    #[error("session date {date} is in the past")]
    DateInPast { date: NaiveDate },
    #[error("an active session already exists on {date} ({existing})")]
    SessionExists { date: NaiveDate, existing: SessionId },
    #[error("session must end after it starts ({start} to {end})")]
    InvalidTimeRange { start: String, end: String },
    #[error("session capacity must be at least 1")]
    ZeroCapacity,
    #[error("capacity {capacity} is below the {enrolled} participants already enrolled")]
    CapacityBelowEnrollment { capacity: u32, enrolled: u32 },
    #[error("session {session} is '{status}', not active")]
    SessionInactive {
        session: SessionId,
        status: &'static str,
    },
    #[error("session on {date} has already taken place")]
    SessionPassed { date: NaiveDate },
    #[error("registration is '{status}' but enrollment requires '{}'", RegistrationStatus::AwaitingCounseling.label())]
    RegistrationNotReady { status: RegistrationStatus },
    #[error("registration {registration} is already enrolled in this session")]
    AlreadyEnrolled { registration: RegistrationId },
    #[error("session is full ({capacity} participants)")]
    SessionFull { capacity: u32 },
    #[error("registration {registration} is not enrolled in any counseling session")]
    NotEnrolled { registration: RegistrationId },
}

impl CounselingViolation {
    /// Violations caused by existing state rather than by the request itself.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SessionExists { .. } | Self::AlreadyEnrolled { .. } | Self::SessionFull { .. }
        )
    }
}

/// Date, time-range and one-per-day rules for creating or moving a session.
pub fn check_schedulable(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    today: NaiveDate,
    same_day: &[CounselingSession],
    exclude: Option<&SessionId>,
) -> Result<(), CounselingViolation> {
    if !is_wednesday(date) {
        return Err(CounselingViolation::NotWednesday { date });
    }
    if date < today {
        return Err(CounselingViolation::DateInPast { date });
    }
    if end <= start {
        return Err(CounselingViolation::InvalidTimeRange {
            start: format_clock_time(start),
            end: format_clock_time(end),
        });
    }

    let existing = same_day
        .iter()
        .filter(|session| session.date == date && session.is_active())
        .find(|session| Some(&session.id) != exclude);
    match existing {
        Some(session) => Err(CounselingViolation::SessionExists {
            date,
            existing: session.id.clone(),
        }),
        None => Ok(()),
    }
}

pub fn check_capacity(capacity: u32, enrolled: usize) -> Result<(), CounselingViolation> {
    if capacity == 0 {
        return Err(CounselingViolation::ZeroCapacity);
    }
    let enrolled = enrolled as u32;
    if capacity < enrolled {
        return Err(CounselingViolation::CapacityBelowEnrollment { capacity, enrolled });
    }
    Ok(())
}

/// Enrollment rules, checked in order: session active, not passed, registration
/// awaiting counseling, not already enrolled, seat available.
pub fn check_enrollable(
    session: &CounselingSession,
    today: NaiveDate,
    registration: &RegistrationId,
    registration_status: RegistrationStatus,
    enrollments: &[Enrollment],
) -> Result<(), CounselingViolation> {
    if !session.is_active() {
        return Err(CounselingViolation::SessionInactive {
            session: session.id.clone(),
            status: session.status.label(),
        });
    }
    if session.date < today {
        return Err(CounselingViolation::SessionPassed { date: session.date });
    }
    if registration_status != RegistrationStatus::AwaitingCounseling {
        return Err(CounselingViolation::RegistrationNotReady {
            status: registration_status,
        });
    }
    if enrollments
        .iter()
        .any(|enrollment| &enrollment.registration == registration)
    {
        return Err(CounselingViolation::AlreadyEnrolled {
            registration: registration.clone(),
        });
    }
    if session.remaining_capacity(enrollments.len()) == 0 {
        return Err(CounselingViolation::SessionFull {
            capacity: session.capacity,
        });
    }
    Ok(())
}

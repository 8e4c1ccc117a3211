//! Indonesian notification texts for each workflow event.

use chrono::{Datelike, NaiveDate};

use super::calendar::format_clock_time;
use super::counseling::CounselingSession;
use super::domain::{Officiant, RegistrationRecord, RegistrationStatus, Role};
use super::notifications::{NotificationEvent, NotificationKind, Recipient, Subject, Tone};

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// `02 Januari 2006`
pub fn long_date(date: NaiveDate) -> String {
    let month = MONTHS[date.month0() as usize];
    format!("{:02} {} {}", date.day(), month, date.year())
}

fn registration_link(record: &RegistrationRecord) -> String {
    format!("/simnikah/pendaftaran/{}", record.id)
}

fn session_link(session: &CounselingSession) -> String {
    format!("/simnikah/bimbingan/{}", session.id)
}

fn for_applicant(record: &RegistrationRecord, event: NotificationEvent) -> NotificationEvent {
    event
        .link(registration_link(record))
        .about(Subject::Registration(record.id.clone()))
}

const OFFICE_ROLES: [Role; 2] = [Role::Staff, Role::HeadOfOffice];

pub fn registration_created(record: &RegistrationRecord) -> Vec<NotificationEvent> {
    let mut events = vec![for_applicant(
        record,
        NotificationEvent::new(
            NotificationKind::RegistrationCreated,
            Recipient::User(record.applicant.clone()),
            "Pendaftaran Nikah Berhasil",
            format!(
                "Pendaftaran nikah Anda dengan {} berhasil dibuat dengan nomor pendaftaran {}. Silakan tunggu proses verifikasi dari KUA.",
                record.bride.full_name, record.number
            ),
        )
        .tone(Tone::Success),
    )];

    for role in OFFICE_ROLES {
        events.push(for_applicant(
            record,
            NotificationEvent::new(
                NotificationKind::RegistrationCreated,
                Recipient::Role(role),
                "Pendaftaran Nikah Baru",
                format!(
                    "Pendaftaran nikah baru dari {} dan {} dengan nomor pendaftaran {}",
                    record.groom.full_name, record.bride.full_name, record.number
                ),
            ),
        ));
    }
    events
}

pub fn status_changed(record: &RegistrationRecord) -> NotificationEvent {
    let partner = &record.bride.full_name;
    let (tone, message) = match record.status {
        RegistrationStatus::AwaitingDocumentSubmission => (
            Tone::Success,
            format!("Formulir pendaftaran nikah Anda dengan {partner} telah disetujui. Silakan kumpulkan berkas ke KUA."),
        ),
        RegistrationStatus::CounselingDone => (
            Tone::Info,
            format!("Anda telah menyelesaikan bimbingan perkawinan. Pendaftaran nikah Anda dengan {partner} siap untuk dilaksanakan."),
        ),
        RegistrationStatus::Completed => (
            Tone::Success,
            format!("Selamat! Proses nikah Anda dengan {partner} telah selesai. Semoga menjadi keluarga yang sakinah, mawaddah, wa rahmah."),
        ),
        RegistrationStatus::Rejected => (
            Tone::Error,
            format!("Maaf, pendaftaran nikah Anda dengan {partner} ditolak. Silakan hubungi KUA untuk informasi lebih lanjut."),
        ),
        status => (
            Tone::Info,
            format!("Status pendaftaran nikah Anda dengan {partner} telah diubah menjadi {status}."),
        ),
    };

    for_applicant(
        record,
        NotificationEvent::new(
            NotificationKind::StatusChanged,
            Recipient::User(record.applicant.clone()),
            "Update Status Pendaftaran Nikah",
            message,
        )
        .tone(tone),
    )
}

pub fn visit_confirmed(record: &RegistrationRecord) -> Vec<NotificationEvent> {
    vec![for_applicant(
        record,
        NotificationEvent::new(
            NotificationKind::VisitConfirmed,
            Recipient::Role(Role::Staff),
            "Kunjungan Dikonfirmasi",
            format!(
                "Pendaftar {} telah mengonfirmasi kunjungan ke KUA dan siap untuk penugasan penghulu.",
                record.number
            ),
        ),
    )]
}

pub fn officiant_assigned(
    record: &RegistrationRecord,
    officiant: &Officiant,
) -> Vec<NotificationEvent> {
    vec![
        for_applicant(
            record,
            NotificationEvent::new(
                NotificationKind::OfficiantAssigned,
                Recipient::User(officiant.user_id.clone()),
                "Penugasan Nikah Baru",
                format!(
                    "Anda ditugaskan untuk memimpin nikah {} dan {} pada {} pukul {} di {}.",
                    record.groom.full_name,
                    record.bride.full_name,
                    long_date(record.wedding_date),
                    format_clock_time(record.wedding_time),
                    record.venue.address()
                ),
            ),
        ),
        for_applicant(
            record,
            NotificationEvent::new(
                NotificationKind::OfficiantAssigned,
                Recipient::User(record.applicant.clone()),
                "Penghulu Ditugaskan",
                format!(
                    "Penghulu {} telah ditugaskan untuk memimpin nikah Anda dengan {}.",
                    officiant.name, record.bride.full_name
                ),
            )
            .tone(Tone::Success),
        ),
    ]
}

pub fn officiant_changed(
    record: &RegistrationRecord,
    previous: Option<&Officiant>,
    replacement: &Officiant,
) -> Vec<NotificationEvent> {
    let mut events = vec![
        for_applicant(
            record,
            NotificationEvent::new(
                NotificationKind::OfficiantChanged,
                Recipient::User(replacement.user_id.clone()),
                "Penugasan Nikah Baru",
                format!(
                    "Anda ditugaskan menggantikan penghulu sebelumnya untuk nikah {} dan {} pada {} pukul {}.",
                    record.groom.full_name,
                    record.bride.full_name,
                    long_date(record.wedding_date),
                    format_clock_time(record.wedding_time)
                ),
            ),
        ),
        for_applicant(
            record,
            NotificationEvent::new(
                NotificationKind::OfficiantChanged,
                Recipient::User(record.applicant.clone()),
                "Penghulu Diganti",
                format!(
                    "Penghulu untuk nikah Anda dengan {} diganti menjadi {}.",
                    record.bride.full_name, replacement.name
                ),
            )
            .tone(Tone::Warning),
        ),
    ];

    if let Some(previous) = previous {
        events.push(for_applicant(
            record,
            NotificationEvent::new(
                NotificationKind::OfficiantChanged,
                Recipient::User(previous.user_id.clone()),
                "Penugasan Nikah Dibatalkan",
                format!(
                    "Penugasan Anda untuk nikah nomor {} telah dialihkan ke penghulu lain.",
                    record.number
                ),
            )
            .tone(Tone::Warning),
        ));
    }
    events
}

pub fn session_event(
    kind: NotificationKind,
    session: &CounselingSession,
    recipient: Recipient,
) -> NotificationEvent {
    let date = long_date(session.date);
    let start = format_clock_time(session.start_time);
    let end = format_clock_time(session.end_time);
    let (tone, title, message) = match kind {
        NotificationKind::SessionUpdated => (
            Tone::Warning,
            "Update Jadwal Bimbingan Perkawinan",
            format!(
                "Jadwal bimbingan perkawinan telah diubah. Tanggal: {date}, Waktu: {start} - {end}, Tempat: {}.",
                session.venue
            ),
        ),
        NotificationKind::SessionCancelled => (
            Tone::Error,
            "Bimbingan Perkawinan Dibatalkan",
            format!("Bimbingan perkawinan pada {date} telah dibatalkan. Silakan hubungi KUA untuk informasi lebih lanjut."),
        ),
        _ => (
            Tone::Info,
            "Bimbingan Perkawinan Baru",
            format!(
                "Bimbingan perkawinan baru telah dijadwalkan pada {date} pukul {start} - {end} di {}.",
                session.venue
            ),
        ),
    };

    NotificationEvent::new(kind, recipient, title, message)
        .tone(tone)
        .link(session_link(session))
        .about(Subject::Session(session.id.clone()))
}

pub const WEDDING_REMINDER_TITLE: &str = "Pengingat Nikah Besok";
pub const COUNSELING_REMINDER_TITLE: &str = "Pengingat Bimbingan Perkawinan Besok";

pub fn wedding_reminder(record: &RegistrationRecord) -> NotificationEvent {
    for_applicant(
        record,
        NotificationEvent::new(
            NotificationKind::ReminderDue,
            Recipient::User(record.applicant.clone()),
            WEDDING_REMINDER_TITLE,
            format!(
                "Pengingat: Nikah Anda dengan {} akan dilaksanakan besok ({}) pukul {} di {}. Pastikan semua persiapan sudah siap!",
                record.bride.full_name,
                long_date(record.wedding_date),
                format_clock_time(record.wedding_time),
                record.venue.kind().label()
            ),
        )
        .tone(Tone::Warning),
    )
}

pub fn counseling_reminder(session: &CounselingSession, recipient: Recipient) -> NotificationEvent {
    NotificationEvent::new(
        NotificationKind::ReminderDue,
        recipient,
        COUNSELING_REMINDER_TITLE,
        format!(
            "Pengingat: Bimbingan perkawinan akan dilaksanakan besok ({}) pukul {} - {} di {}. Pastikan Anda hadir tepat waktu!",
            long_date(session.date),
            format_clock_time(session.start_time),
            format_clock_time(session.end_time),
            session.venue
        ),
    )
    .tone(Tone::Warning)
    .link(session_link(session))
    .about(Subject::Session(session.id.clone()))
}

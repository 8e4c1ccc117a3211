use serde_json::json;

use super::common::*;

use crate::workflows::marriage::agenda::{CounselingDayStatus, DayColor, WeddingDayStatus};
use crate::workflows::marriage::domain::{RegistrationStatus, Venue};
use crate::workflows::marriage::service::ErrorKind;

/// June 2025 with a mix of statuses: a past wedding on the 1st, review-only on the
/// 10th, mixed on the 11th, rejected-only on the 12th, and a full office on the 16th.
fn june(store: &MemoryStore) {
    store.seed(record(1, date(2025, 6, 1), time(9, 0), RegistrationStatus::Completed, Some(officiant(1).id)));
    store.seed(record(2, date(2025, 6, 10), time(9, 0), RegistrationStatus::AwaitingFormReview, None));
    store.seed(record(3, date(2025, 6, 11), time(9, 0), RegistrationStatus::DocumentsReceived, None));
    store.seed(record(4, date(2025, 6, 11), time(10, 0), RegistrationStatus::AwaitingDocumentSubmission, None));
    store.seed(record(5, date(2025, 6, 12), time(9, 0), RegistrationStatus::Rejected, None));
    for n in 0..9 {
        store.seed(record(
            10 + n,
            date(2025, 6, 16),
            time(16 - n, 0),
            RegistrationStatus::AwaitingCounseling,
            Some(officiant(1 + n % 2).id),
        ));
    }
    let mut offsite = record(
        30,
        date(2025, 6, 16),
        time(8, 30),
        RegistrationStatus::AwaitingOfficiantAssignment,
        None,
    );
    offsite.venue = Venue::Offsite {
        address: "Jl. Kayu Tangi II No. 8, Banjarmasin".to_string(),
        coordinates: None,
    };
    store.seed(offsite);
}

#[test]
fn wedding_month_colors_and_statuses() {
    let (workflow, store, _) = build_workflow();
    june(&store);

    let month = workflow.agenda().wedding_month(2025, 6).expect("june");
    assert_eq!(month.days.len(), 30);

    let first = month.day(1).expect("day 1");
    assert_eq!(first.status, WeddingDayStatus::Past);
    assert!(!first.available);
    assert_eq!(first.color, Some(DayColor::Green));

    let tenth = month.day(10).expect("day 10");
    assert_eq!(tenth.status, WeddingDayStatus::Available);
    assert_eq!(tenth.color, Some(DayColor::Yellow));
    assert_eq!(tenth.in_review, 1);
    assert_eq!(tenth.remaining_office_quota, 8);

    let eleventh = month.day(11).expect("day 11");
    assert_eq!(eleventh.color, Some(DayColor::Green));
    assert_eq!((eleventh.settled, eleventh.in_review), (1, 1));

    let twelfth = month.day(12).expect("day 12");
    assert_eq!(twelfth.total, 0);
    assert_eq!(twelfth.color, None);
    assert_eq!(twelfth.remaining_office_quota, 9);

    let sixteenth = month.day(16).expect("day 16");
    assert_eq!(sixteenth.status, WeddingDayStatus::Full);
    assert_eq!(sixteenth.total, 10);
    assert_eq!(sixteenth.at_office, 9);
    assert_eq!(sixteenth.offsite, 1);
    assert_eq!(sixteenth.remaining_office_quota, 0);

    let rendered = serde_json::to_value(sixteenth).expect("serializes");
    assert_eq!(rendered["status"], json!("Penuh"));
    assert_eq!(rendered["color"], json!("hijau"));
    assert_eq!(rendered["date"], json!("2025-06-16"));
}

#[test]
fn invalid_month_is_a_validation_error() {
    let (workflow, _, _) = build_workflow();
    let error = workflow
        .agenda()
        .wedding_month(2025, 13)
        .expect_err("no thirteenth month");
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert_eq!(error.to_string(), "2025-13 is not a valid calendar month");
}

#[test]
fn wedding_day_lists_ceremonies_in_time_order() {
    let (workflow, store, _) = build_workflow();
    june(&store);

    let detail = workflow
        .agenda()
        .wedding_day(date(2025, 6, 16))
        .expect("day detail");
    assert_eq!(detail.weddings.len(), 10);
    assert_eq!(detail.at_office, 9);
    assert_eq!(detail.remaining_office_quota, 0);

    let times: Vec<&str> = detail.weddings.iter().map(|w| w.time.as_str()).collect();
    assert_eq!(times.first(), Some(&"08:00"));
    assert_eq!(times[1], "08:30");
    assert_eq!(times.last(), Some(&"16:00"));
    assert_eq!(detail.weddings[1].venue, "Di Luar KUA");
    assert_eq!(detail.weddings[1].address, "Jl. Kayu Tangi II No. 8, Banjarmasin");

    let rejected = workflow
        .agenda()
        .wedding_day(date(2025, 6, 12))
        .expect("day detail");
    assert!(rejected.weddings.is_empty());
}

#[test]
fn counseling_month_marks_wednesdays_and_seats() {
    let (workflow, store, _) = build_workflow();
    let full = workflow
        .counseling()
        .create_session(&staff(), session_draft(Some(2)))
        .expect("11 june");
    let mut later = session_draft(None);
    later.date = date(2025, 6, 18);
    workflow
        .counseling()
        .create_session(&staff(), later)
        .expect("18 june");

    for n in 1..=2 {
        let ready = record(
            n,
            date(2025, 6, 16),
            time(7 + n * 2, 0),
            RegistrationStatus::AwaitingCounseling,
            Some(officiant(1).id),
        );
        let id = ready.id.clone();
        store.seed(ready);
        workflow
            .counseling()
            .enroll(&staff(), &full.id, &id)
            .expect("enrolled");
    }

    let month = workflow.agenda().counseling_month(2025, 6).expect("june");
    let status_of = |day| month.day(day).expect("day in june").status;

    assert_eq!(status_of(1), CounselingDayStatus::Past);
    assert_eq!(status_of(4), CounselingDayStatus::NotScheduled);
    assert_eq!(status_of(5), CounselingDayStatus::NotWednesday);
    assert_eq!(status_of(11), CounselingDayStatus::Full);
    assert_eq!(status_of(18), CounselingDayStatus::Available);
    assert_eq!(status_of(25), CounselingDayStatus::NotScheduled);

    let eleventh = month.day(11).expect("day 11");
    let summary = eleventh.session.as_ref().expect("session summary");
    assert_eq!(summary.enrolled, 2);
    assert_eq!(summary.capacity, 2);
    assert_eq!(summary.start_time, "08:00");
    assert!(!eleventh.available);

    let eighteenth = month.day(18).expect("day 18");
    assert!(eighteenth.available);
    assert_eq!(eighteenth.remaining, 10);

    let rendered = serde_json::to_value(month.day(5).expect("day 5")).expect("serializes");
    assert_eq!(rendered["status"], json!("Bukan Hari Rabu"));
}

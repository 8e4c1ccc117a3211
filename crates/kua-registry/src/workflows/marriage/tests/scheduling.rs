use chrono::{NaiveDate, NaiveTime};

use super::common::*;

use crate::workflows::marriage::domain::{
    OfficiantId, OfficiantStatus, RegistrationNumber, RegistrationRecord, RegistrationStatus,
    Venue,
};
use crate::workflows::marriage::notifications::{NotificationKind, Recipient};
use crate::workflows::marriage::scheduling::{
    ConflictDetector, LoadStatus, ScheduleConflict, SchedulingConfig,
};
use crate::workflows::marriage::service::{ErrorKind, MarriageWorkflow, WorkflowError};

fn wedding_day() -> NaiveDate {
    date(2025, 6, 16)
}

fn pgh(n: u32) -> OfficiantId {
    officiant(n).id
}

fn on_day(
    n: u32,
    at: NaiveTime,
    status: RegistrationStatus,
    officiant: Option<u32>,
) -> RegistrationRecord {
    record(n, wedding_day(), at, status, officiant.map(pgh))
}

/// Stores an already-assigned ceremony on the wedding day.
fn seed_assigned(store: &MemoryStore, n: u32, at: NaiveTime, officiant: u32) {
    store.seed(record(
        n,
        wedding_day(),
        at,
        RegistrationStatus::AwaitingOfficiantVerification,
        Some(pgh(officiant)),
    ));
}

#[test]
fn ceremony_fifty_minutes_after_another_is_refused() {
    let (workflow, store, _) = build_workflow();
    seed_assigned(&store, 1, time(8, 0), 1);
    let target = ready_for_assignment(&workflow, 1, "2025-06-16", "08:50");

    match workflow
        .registrations()
        .assign_officiant(&head(), &target.id, &pgh(1))
    {
        Err(WorkflowError::Schedule(ScheduleConflict::OfficiantBusy {
            conflicting,
            conflicting_time,
            window_minutes,
            ..
        })) => {
            assert_eq!(conflicting, RegistrationNumber("NKHSEED001".to_string()));
            assert_eq!(conflicting_time, "08:00");
            assert_eq!(window_minutes, 60);
        }
        other => panic!("expected officiant busy, got {other:?}"),
    }
    assert_eq!(
        store.registration(&target.id).status,
        RegistrationStatus::AwaitingOfficiantAssignment
    );

    let outcome = workflow
        .registrations()
        .assign_officiant(&head(), &target.id, &pgh(2))
        .expect("second officiant is free");
    assert_eq!(outcome.registration.officiant, Some(pgh(2)));
}

#[test]
fn ceremony_two_hours_after_another_is_accepted() {
    let (workflow, store, sink) = build_workflow();
    seed_assigned(&store, 1, time(8, 0), 1);
    let target = ready_for_assignment(&workflow, 1, "2025-06-16", "10:00");
    sink.clear();

    let outcome = workflow
        .registrations()
        .assign_officiant(&head(), &target.id, &pgh(1))
        .expect("two hours apart");

    assert_eq!(outcome.check.officiant_day_count, 2);
    assert_eq!(outcome.check.warning, None);
    let stored = store.registration(&target.id);
    assert_eq!(
        stored.status,
        RegistrationStatus::AwaitingOfficiantVerification
    );
    assert_eq!(stored.assigned_by, Some(head().id));
    assert_eq!(stored.assigned_at, Some(now()));

    let to_officiant = sink.sent_to(&Recipient::User(officiant(1).user_id));
    assert_eq!(to_officiant.len(), 1);
    assert_eq!(to_officiant[0].kind, NotificationKind::OfficiantAssigned);
    assert!(to_officiant[0].message.contains("16 Juni 2025 pukul 10:00"));
}

#[test]
fn separation_window_is_inclusive_at_exactly_sixty_minutes() {
    let detector = ConflictDetector::default();
    let held = on_day(1, time(8, 0), RegistrationStatus::AwaitingCounseling, Some(1));
    let target = on_day(2, time(9, 0), RegistrationStatus::AwaitingOfficiantAssignment, None);

    let check = detector
        .check_assignment(&target, &pgh(1), &[held, target.clone()])
        .expect("sixty minutes is enough");
    assert_eq!(check.officiant_day_count, 2);
}

#[test]
fn tenth_office_ceremony_is_refused_once_nine_are_assigned() {
    let (workflow, store, _) = build_workflow();
    for n in 1..=9 {
        // Spread over officiants that do not exist so only the venue cap applies.
        seed_assigned(&store, n, time(7 + n, 0), 10 + n);
    }
    let target = ready_for_assignment(&workflow, 1, "2025-06-16", "16:30");

    let error = workflow
        .registrations()
        .assign_officiant(&head(), &target.id, &pgh(1))
        .expect_err("venue full");
    assert_eq!(error.kind(), ErrorKind::Conflict);
    match error {
        WorkflowError::Schedule(ScheduleConflict::VenueFull {
            capacity,
            scheduled,
            date: full_on,
        }) => {
            assert_eq!(capacity, 9);
            assert_eq!(scheduled, 9);
            assert_eq!(full_on, wedding_day());
        }
        other => panic!("expected venue full, got {other:?}"),
    }
}

#[test]
fn venue_cap_ignores_unscheduled_and_offsite_ceremonies() {
    let detector = ConflictDetector::default();
    let mut day = Vec::new();
    for n in 1..=8 {
        day.push(on_day(n, time(7 + n, 0), RegistrationStatus::AwaitingCounseling, Some(10 + n)));
    }
    // Not yet holding a slot.
    day.push(on_day(9, time(16, 0), RegistrationStatus::DocumentsReceived, None));
    let mut offsite = on_day(10, time(16, 0), RegistrationStatus::AwaitingCounseling, Some(20));
    offsite.venue = Venue::Offsite {
        address: "Jl. Kayu Tangi".to_string(),
        coordinates: None,
    };
    day.push(offsite);
    assert_eq!(detector.office_bookings(wedding_day(), &day), 8);

    let target = on_day(11, time(17, 0), RegistrationStatus::AwaitingOfficiantAssignment, None);
    detector
        .check_assignment(&target, &pgh(1), &day)
        .expect("ninth office ceremony fits");

    day.push(on_day(12, time(17, 30), RegistrationStatus::Completed, Some(21)));
    let mut offsite_target = target.clone();
    offsite_target.venue = Venue::Offsite {
        address: "Jl. A. Yani Km 5".to_string(),
        coordinates: None,
    };
    detector
        .check_assignment(&offsite_target, &pgh(1), &day)
        .expect("offsite ceremonies are not capped");
    match detector.check_assignment(&target, &pgh(1), &day) {
        Err(ScheduleConflict::VenueFull { scheduled: 9, .. }) => {}
        other => panic!("expected venue full, got {other:?}"),
    }
}

#[test]
fn rejected_ceremonies_do_not_block_the_officiant() {
    let (workflow, store, _) = build_workflow();
    store.seed(record(
        1,
        wedding_day(),
        time(8, 0),
        RegistrationStatus::Rejected,
        Some(pgh(1)),
    ));
    let target = ready_for_assignment(&workflow, 1, "2025-06-16", "08:30");

    let outcome = workflow
        .registrations()
        .assign_officiant(&head(), &target.id, &pgh(1))
        .expect("rejected registration frees the slot");
    assert_eq!(outcome.check.officiant_day_count, 1);
}

#[test]
fn third_ceremony_of_the_day_carries_a_quota_warning() {
    let (workflow, store, _) = build_workflow();
    seed_assigned(&store, 1, time(8, 0), 1);
    seed_assigned(&store, 2, time(10, 0), 1);
    let target = ready_for_assignment(&workflow, 1, "2025-06-16", "13:00");

    let outcome = workflow
        .registrations()
        .assign_officiant(&head(), &target.id, &pgh(1))
        .expect("quota is a soft limit on assignment");
    assert_eq!(outcome.check.officiant_day_count, 3);
    assert_eq!(
        outcome.check.warning.as_deref(),
        Some("Peringatan: penghulu ini memiliki 3 jadwal pada tanggal 2025-06-16")
    );
}

#[test]
fn inactive_and_unknown_officiants_cannot_be_assigned() {
    let (workflow, store, _) = build_workflow();
    let mut retired = officiant(3);
    retired.status = OfficiantStatus::Inactive;
    store
        .officiants
        .lock()
        .expect("officiant mutex poisoned")
        .insert(retired.id.clone(), retired);
    let target = ready_for_assignment(&workflow, 1, "2025-06-16", "09:00");

    let error = workflow
        .registrations()
        .assign_officiant(&head(), &target.id, &pgh(3))
        .expect_err("inactive officiant");
    assert_eq!(error.kind(), ErrorKind::Validation);

    let error = workflow
        .registrations()
        .assign_officiant(&head(), &target.id, &pgh(99))
        .expect_err("unknown officiant");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn assignment_requires_a_confirmed_visit() {
    let (workflow, _, _) = build_workflow();
    let record = workflow
        .registrations()
        .submit(&applicant(1), submission("2025-06-16", "09:00"))
        .expect("submitted");

    match workflow
        .registrations()
        .assign_officiant(&head(), &record.id, &pgh(1))
    {
        Err(WorkflowError::Precondition { current, required }) => {
            assert_eq!(current, RegistrationStatus::AwaitingFormReview);
            assert_eq!(required, RegistrationStatus::AwaitingOfficiantAssignment);
        }
        other => panic!("expected precondition failure, got {other:?}"),
    }
}

/// Registration assigned to officiant 1 at `at` on the wedding day.
fn assigned_to_first(
    workflow: &MarriageWorkflow<MemoryStore, RecordingSink>,
    at: &str,
) -> RegistrationRecord {
    let target = ready_for_assignment(workflow, 1, "2025-06-16", at);
    workflow
        .registrations()
        .assign_officiant(&head(), &target.id, &pgh(1))
        .expect("assigned")
        .registration
}

#[test]
fn change_treats_the_daily_quota_as_a_hard_limit() {
    let (workflow, store, _) = build_workflow();
    seed_assigned(&store, 1, time(8, 0), 2);
    seed_assigned(&store, 2, time(11, 0), 2);
    seed_assigned(&store, 3, time(14, 0), 2);
    let target = assigned_to_first(&workflow, "16:30");

    match workflow
        .registrations()
        .change_officiant(&head(), &target.id, &pgh(2), None)
    {
        Err(WorkflowError::Schedule(ScheduleConflict::OfficiantQuotaReached {
            quota,
            scheduled,
            ..
        })) => {
            assert_eq!(quota, 3);
            assert_eq!(scheduled, 3);
        }
        other => panic!("expected quota refusal, got {other:?}"),
    }
}

#[test]
fn change_uses_the_wider_two_hour_window() {
    let (workflow, store, _) = build_workflow();
    seed_assigned(&store, 1, time(8, 0), 2);
    let target = assigned_to_first(&workflow, "09:30");

    match workflow
        .registrations()
        .change_officiant(&head(), &target.id, &pgh(2), None)
    {
        Err(WorkflowError::Schedule(ScheduleConflict::OfficiantBusy {
            window_minutes, ..
        })) => assert_eq!(window_minutes, 120),
        other => panic!("expected officiant busy, got {other:?}"),
    }

    let detector = ConflictDetector::new(SchedulingConfig::default());
    let fresh = on_day(9, time(9, 30), RegistrationStatus::AwaitingOfficiantAssignment, None);
    let seeded = on_day(1, time(8, 0), RegistrationStatus::AwaitingOfficiantVerification, Some(2));
    detector
        .check_assignment(&fresh, &pgh(2), &[seeded])
        .expect("ninety minutes is enough for a first assignment");
}

#[test]
fn change_to_the_same_officiant_is_refused() {
    let (workflow, _, _) = build_workflow();
    let target = assigned_to_first(&workflow, "09:00");

    let error = workflow
        .registrations()
        .change_officiant(&head(), &target.id, &pgh(1), None)
        .expect_err("same officiant");
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert!(matches!(
        error,
        WorkflowError::Schedule(ScheduleConflict::SameOfficiant { .. })
    ));
}

#[test]
fn change_without_a_current_officiant_is_a_precondition_failure() {
    let detector = ConflictDetector::default();
    let target = on_day(1, time(9, 0), RegistrationStatus::AwaitingOfficiantVerification, None);
    assert_eq!(
        detector.check_change(&target, &pgh(2), &[]),
        Err(ScheduleConflict::NoCurrentOfficiant)
    );
    let error = WorkflowError::from(ScheduleConflict::NoCurrentOfficiant);
    assert_eq!(error.kind(), ErrorKind::Precondition);
}

#[test]
fn change_records_the_trail_and_notifies_everyone() {
    let (workflow, store, sink) = build_workflow();
    let target = assigned_to_first(&workflow, "09:00");
    sink.clear();

    let outcome = workflow
        .registrations()
        .change_officiant(
            &head(),
            &target.id,
            &pgh(2),
            Some("Penghulu berhalangan".to_string()),
        )
        .expect("changed");

    let stored = store.registration(&target.id);
    assert_eq!(stored.officiant, Some(pgh(2)));
    assert_eq!(
        stored.status,
        RegistrationStatus::AwaitingOfficiantVerification
    );
    assert_eq!(
        stored.notes.as_deref(),
        Some("Penghulu diganti dari PGH001 ke PGH002: Penghulu berhalangan")
    );
    assert_eq!(outcome.check.officiant_day_count, 1);

    for recipient in [
        Recipient::User(officiant(2).user_id),
        Recipient::User(applicant(1).id),
        Recipient::User(officiant(1).user_id),
    ] {
        let events = sink.sent_to(&recipient);
        assert_eq!(events.len(), 1, "one notice for {recipient:?}");
        assert_eq!(events[0].kind, NotificationKind::OfficiantChanged);
    }
}

#[test]
fn change_requires_awaiting_officiant_verification() {
    let (workflow, _, _) = build_workflow();
    let record = awaiting_counseling(&workflow, 1, "09:00");

    let error = workflow
        .registrations()
        .change_officiant(&head(), &record.id, &pgh(2), None)
        .expect_err("already verified");
    assert_eq!(error.kind(), ErrorKind::Precondition);
}

#[test]
fn slots_are_blocked_within_an_hour_of_a_ceremony() {
    let detector = ConflictDetector::default();
    let held = on_day(1, time(9, 30), RegistrationStatus::AwaitingCounseling, Some(1));
    let availability = detector.availability(&pgh(1), wedding_day(), &[held]);

    assert_eq!(availability.slots.len(), 9);
    assert_eq!(availability.slots[0].start, time(8, 0));
    assert_eq!(availability.slots[8].start, time(16, 0));
    let blocked: Vec<_> = availability
        .slots
        .iter()
        .filter(|slot| !slot.available)
        .map(|slot| slot.start)
        .collect();
    assert_eq!(blocked, vec![time(9, 0), time(10, 0)]);
    assert_eq!(
        availability.slots[1].conflicting,
        Some(RegistrationNumber("NKHSEED001".to_string()))
    );
    assert_eq!(availability.scheduled, 1);
    assert_eq!(availability.remaining_quota, 2);
    assert!(!availability.fully_booked);
}

#[test]
fn day_schedule_reports_load_per_officiant() {
    let detector = ConflictDetector::default();
    let day = vec![
        on_day(1, time(14, 0), RegistrationStatus::AwaitingCounseling, Some(1)),
        on_day(2, time(8, 0), RegistrationStatus::CounselingDone, Some(1)),
        on_day(3, time(11, 0), RegistrationStatus::Completed, Some(1)),
        on_day(4, time(9, 0), RegistrationStatus::AwaitingCounseling, Some(2)),
    ];

    let first = detector.day_schedule(&officiant(1), wedding_day(), &day);
    assert_eq!(first.load, LoadStatus::Full);
    assert_eq!(first.remaining_quota, 0);
    let times: Vec<&str> = first.ceremonies.iter().map(|c| c.time.as_str()).collect();
    assert_eq!(times, vec!["08:00", "11:00", "14:00"]);

    assert_eq!(
        detector.day_schedule(&officiant(2), wedding_day(), &day).load,
        LoadStatus::Partial
    );
    assert_eq!(
        detector.day_schedule(&officiant(3), wedding_day(), &day).load,
        LoadStatus::Empty
    );
}

#[test]
fn officiant_slots_through_the_agenda_service() {
    let (workflow, store, _) = build_workflow();
    seed_assigned(&store, 1, time(8, 0), 1);

    let availability = workflow
        .agenda()
        .officiant_slots(&pgh(1), wedding_day())
        .expect("slots");
    assert!(!availability.slots[0].available);
    assert!(availability.slots[1].available);

    let error = workflow
        .agenda()
        .officiant_slots(&pgh(42), wedding_day())
        .expect_err("unknown officiant");
    assert_eq!(error.kind(), ErrorKind::NotFound);

    let schedules = workflow
        .agenda()
        .officiant_schedules(wedding_day())
        .expect("schedules");
    assert_eq!(schedules.len(), 2);
    assert_eq!(schedules[0].scheduled, 1);
    assert_eq!(schedules[1].load, LoadStatus::Empty);
}

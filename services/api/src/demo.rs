use crate::infra::{seeded_officiants, InMemoryRegistryStore};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Weekday};
use clap::Args;
use kua_registry::error::AppError;
use kua_registry::workflows::marriage::agenda::{CounselingMonth, WeddingMonth};
use kua_registry::workflows::marriage::forms::{
    GuardianForm, ParentForm, PersonForm, ScheduleForm,
};
use kua_registry::workflows::marriage::service::ReviewDecision;
use kua_registry::workflows::marriage::{
    Actor, CounselingSession, FixedClock, MarriageWorkflow, NotificationError, NotificationEvent,
    NotificationOutbox, NotificationPublisher, NotificationWorker, OfficiantId,
    RegistrationRecord, RegistrationSubmission, ReminderScanner, Role, SchedulingConfig,
    SessionDraft, WorkflowError,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the office is simulated on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CalendarArgs {
    /// Calendar year. Defaults to the year of `--today`.
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// Calendar month (1-12). Defaults to the month of `--today`.
    #[arg(long)]
    pub(crate) month: Option<u32>,
    /// Date the office is simulated on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RemindArgs {
    /// Scan date (YYYY-MM-DD); reminders go out for the following day.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

type DemoWorkflow = MarriageWorkflow<InMemoryRegistryStore, NotificationOutbox>;

/// Prints every notification as the applicant or office would see it.
#[derive(Debug, Default, Clone, Copy)]
struct ConsolePublisher;

impl NotificationPublisher for ConsolePublisher {
    fn deliver(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        println!("  [{:?}] {}: {}", event.recipient, event.title, event.message);
        Ok(())
    }
}

/// An office seeded with two couples at different stages.
struct DemoOffice {
    workflow: Arc<DemoWorkflow>,
    scanner: ReminderScanner<InMemoryRegistryStore, NotificationOutbox>,
    worker: NotificationWorker<ConsolePublisher>,
    scheduled: RegistrationRecord,
    short_notice: RegistrationRecord,
    session: CounselingSession,
}

impl DemoOffice {
    /// Drops every outbox handle and prints what was queued.
    async fn flush(self) -> usize {
        let Self {
            workflow,
            scanner,
            worker,
            ..
        } = self;
        drop(scanner);
        drop(workflow);
        worker.run().await
    }
}

fn applicant(id: &str) -> Actor {
    Actor::new(id, Role::Applicant)
}

fn staff() -> Actor {
    Actor::new("staff-1", Role::Staff)
}

fn head_of_office() -> Actor {
    Actor::new("kepala-1", Role::HeadOfOffice)
}

fn on_the_hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// First Wednesday strictly after `today`.
fn next_wednesday(today: NaiveDate) -> NaiveDate {
    let mut day = today + Duration::days(1);
    while day.weekday() != Weekday::Wed {
        day += Duration::days(1);
    }
    day
}

fn person(nik: &str, full_name: &str, birthdate: &str, email: &str) -> PersonForm {
    PersonForm {
        nik: nik.to_string(),
        full_name: full_name.to_string(),
        birthplace: "Banjarmasin".to_string(),
        birthdate: birthdate.to_string(),
        citizenship: "WNI".to_string(),
        passport_number: None,
        religion: "Islam".to_string(),
        education: "S1".to_string(),
        occupation: "Karyawan Swasta".to_string(),
        occupation_description: None,
        marital_status: "Belum Kawin".to_string(),
        address: "Jl. Kayu Tangi II No. 8, Banjarmasin Utara".to_string(),
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

fn deceased_parent() -> ParentForm {
    ParentForm {
        presence: "Meninggal".to_string(),
        ..ParentForm::default()
    }
}

struct Couple<'a> {
    groom: (&'a str, &'a str),
    bride: (&'a str, &'a str),
    bride_father: (&'a str, &'a str),
}

fn submission(
    couple: &Couple<'_>,
    wedding_date: NaiveDate,
    wedding_time: &str,
    dispensation_number: Option<&str>,
) -> RegistrationSubmission {
    let (father_name, father_nik) = couple.bride_father;
    RegistrationSubmission {
        schedule: ScheduleForm {
            wedding_date: wedding_date.format("%Y-%m-%d").to_string(),
            wedding_time: wedding_time.to_string(),
            venue: "Di KUA".to_string(),
            address: None,
            dispensation_number: dispensation_number.map(str::to_string),
        },
        groom: person(couple.groom.0, couple.groom.1, "1995-03-12", "groom@example.com"),
        bride: person(couple.bride.0, couple.bride.1, "1997-08-21", "bride@example.com"),
        groom_father: living_parent("Abdul Hamid", None),
        groom_mother: living_parent("Fatimah", None),
        bride_father: living_parent(father_name, Some(father_nik)),
        bride_mother: deceased_parent(),
        guardian: GuardianForm {
            nik: father_nik.to_string(),
            full_name: father_name.to_string(),
            relation: "Ayah Kandung".to_string(),
            life_status: "Hidup".to_string(),
            phone: Some("081298765432".to_string()),
            address: None,
        },
    }
}

fn step(narrate: bool, record: &RegistrationRecord, what: &str) {
    if narrate {
        println!("- {what}: {} is now '{}'", record.number, record.status.label());
    }
}

/// Walks the office-side steps up to officiant assignment.
fn walk_to_assignment(
    workflow: &DemoWorkflow,
    owner: &Actor,
    form: RegistrationSubmission,
    officiant: &OfficiantId,
    narrate: bool,
) -> Result<RegistrationRecord, AppError> {
    let services = workflow.registrations();
    let approve = || ReviewDecision::Approve { note: None };

    let record = services.submit(owner, form)?;
    step(narrate, &record, "Submitted");
    let record = services.review_form(&staff(), &record.id, approve())?;
    step(narrate, &record, "Form approved");
    let record = services.review_documents(&staff(), &record.id, approve())?;
    step(narrate, &record, "Documents accepted");
    let record = services.confirm_visit(owner, &record.id)?;
    step(narrate, &record, "Office visit confirmed");

    let outcome = services.assign_officiant(&head_of_office(), &record.id, officiant)?;
    step(narrate, &outcome.registration, "Officiant assigned");
    if narrate {
        if let Some(warning) = &outcome.check.warning {
            println!("  {warning}");
        }
    }
    Ok(outcome.registration)
}

fn seed_office(today: NaiveDate, narrate: bool) -> Result<DemoOffice, AppError> {
    let clock = Arc::new(FixedClock::at(today, on_the_hour(8)));
    let store = Arc::new(InMemoryRegistryStore::with_officiants(seeded_officiants()));
    let (outbox, worker) = NotificationOutbox::channel(Arc::new(ConsolePublisher));
    let outbox = Arc::new(outbox);
    let workflow = Arc::new(MarriageWorkflow::with_clock(
        store.clone(),
        outbox.clone(),
        SchedulingConfig::default(),
        clock.clone(),
    ));
    let scanner = ReminderScanner::new(store, outbox, clock);

    let wedding_date = today + Duration::days(28);
    let session_date = next_wednesday(today);
    if narrate {
        println!("KUA marriage registration demo ({today})");
        println!("\nCouple 1: wedding on {wedding_date} at the office");
    }

    let owner = applicant("user-1");
    let first = Couple {
        groom: ("6371010303950001", "Ahmad Fauzi"),
        bride: ("6371016108970002", "Siti Aminah"),
        bride_father: ("Muhammad Yusuf", "6371010101650003"),
    };
    let scheduled = walk_to_assignment(
        &workflow,
        &owner,
        submission(&first, wedding_date, "09:00", None),
        &OfficiantId("PGH001".to_string()),
        narrate,
    )?;

    let penghulu = Actor::new("penghulu-1", Role::Officiant);
    let scheduled = workflow.registrations().officiant_review(
        &penghulu,
        &scheduled.id,
        ReviewDecision::Approve {
            note: Some("Dokumen lengkap".to_string()),
        },
    )?;
    step(narrate, &scheduled, "Officiant verified documents");

    let session = workflow.counseling().create_session(
        &staff(),
        SessionDraft {
            date: session_date,
            start_time: on_the_hour(8),
            end_time: on_the_hour(12),
            venue: "Aula KUA Banjarmasin Utara".to_string(),
            counselor: "Hj. Rahmawati, S.Psi".to_string(),
            capacity: None,
            notes: None,
        },
    )?;
    let enrollment = workflow
        .counseling()
        .enroll(&owner, &session.id, &scheduled.id)?;
    if narrate {
        println!(
            "- Counseling session {} on {} ({} seats); enrolled as {}",
            session.id, session.date, session.capacity, enrollment.id
        );
    }

    let tomorrow = today + Duration::days(1);
    if narrate {
        println!("\nCouple 2: short-notice wedding on {tomorrow} with dispensation");
    }
    let second = Couple {
        groom: ("6371021505930004", "Rizky Pratama"),
        bride: ("6371026202960005", "Nur Aisyah"),
        bride_father: ("Hasan Basri", "6371020101600006"),
    };
    let short_notice = walk_to_assignment(
        &workflow,
        &applicant("user-2"),
        submission(&second, tomorrow, "10:00", Some("B-123/KUA.17.03/PW.01/2025")),
        &OfficiantId("PGH002".to_string()),
        narrate,
    )?;

    Ok(DemoOffice {
        workflow,
        scanner,
        worker,
        scheduled,
        short_notice,
        session,
    })
}

fn print_wedding_month(month: &WeddingMonth) {
    println!("\nWedding calendar {}-{:02}", month.year, month.month);
    let busy: Vec<_> = month.days.iter().filter(|day| day.total > 0).collect();
    if busy.is_empty() {
        println!("  no weddings scheduled");
    }
    for day in busy {
        println!(
            "  {}  {:<9} {} total ({} at office, {} offsite) | office quota left {}/{} | {}",
            day.date,
            day.status.label(),
            day.total,
            day.at_office,
            day.offsite,
            day.remaining_office_quota,
            day.office_capacity,
            day.color.map(|color| color.label()).unwrap_or("-"),
        );
    }
}

fn print_counseling_month(month: &CounselingMonth) {
    println!("\nCounseling calendar {}-{:02}", month.year, month.month);
    for day in month.days.iter().filter(|day| day.date.weekday() == Weekday::Wed) {
        match &day.session {
            Some(session) => println!(
                "  {}  {:<17} {}-{} {} with {} ({} of {} seats taken)",
                day.date,
                day.status.label(),
                session.start_time,
                session.end_time,
                session.venue,
                session.counselor,
                session.enrolled,
                session.capacity,
            ),
            None => println!("  {}  {}", day.date, day.status.label()),
        }
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let office = seed_office(today, true)?;

    let registrations = office.workflow.registrations();
    let flow = registrations.status_flow(&office.scheduled.id)?;
    println!("\nProgress of {}", office.scheduled.number);
    for entry in &flow.steps {
        let marker = if entry.current {
            ">"
        } else if entry.completed {
            "x"
        } else {
            " "
        };
        println!("  [{marker}] {}", entry.status);
    }

    let agenda = office.workflow.agenda();
    print_wedding_month(&agenda.wedding_month(today.year(), today.month())?);
    let wedding_date = office.scheduled.wedding_date;
    if wedding_date.month() != today.month() {
        print_wedding_month(&agenda.wedding_month(wedding_date.year(), wedding_date.month())?);
    }
    print_counseling_month(
        &agenda.counseling_month(office.session.date.year(), office.session.date.month())?,
    );

    let report = office.scanner.run_for(today).map_err(WorkflowError::from)?;
    println!(
        "\nReminder scan for {}: {} wedding, {} counseling",
        office.short_notice.wedding_date, report.weddings, report.counseling
    );

    let counseled = office
        .workflow
        .counseling()
        .complete_counseling(&staff(), &office.scheduled.id)?;
    step(true, &counseled, "Counseling completed");
    let married = registrations.complete_wedding(&staff(), &office.scheduled.id)?;
    step(true, &married, "Wedding completed");
    println!("  history: {} status changes", married.history.len());

    println!("\nNotifications");
    let delivered = office.flush().await;
    println!("{delivered} notifications delivered");
    Ok(())
}

pub(crate) async fn run_calendar(args: CalendarArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let year = args.year.unwrap_or_else(|| today.year());
    let month = args.month.unwrap_or_else(|| today.month());

    let office = seed_office(today, false)?;
    let agenda = office.workflow.agenda();
    print_wedding_month(&agenda.wedding_month(year, month)?);
    print_counseling_month(&agenda.counseling_month(year, month)?);
    Ok(())
}

pub(crate) async fn run_reminders(args: RemindArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let office = seed_office(today, false)?;

    let first = office.scanner.run_for(today).map_err(WorkflowError::from)?;
    let repeat = office.scanner.run_for(today).map_err(WorkflowError::from)?;
    println!(
        "Reminders for {}: {} wedding, {} counseling, {} failed",
        today + Duration::days(1),
        first.weddings,
        first.counseling,
        first.failed
    );
    println!(
        "Second scan: {} already sent, {} new",
        repeat.already_sent,
        repeat.weddings + repeat.counseling
    );

    println!("\nNotifications");
    office.flush().await;
    Ok(())
}

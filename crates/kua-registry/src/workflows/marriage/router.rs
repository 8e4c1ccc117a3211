use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::calendar::parse_date;
use super::counseling::{AttendanceUpdate, EnrollmentId, SessionDraft, SessionId, SessionUpdate};
use super::domain::{Actor, OfficiantId, RegistrationId, RegistrationStatus, Role};
use super::eligibility::ValidationError;
use super::forms::RegistrationSubmission;
use super::notifications::NotificationSink;
use super::repository::RegistryStore;
use super::scheduling::ScheduleConflict;
use super::service::{AssignmentOutcome, MarriageWorkflow, ReviewDecision, WorkflowError};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

type Workflow<S, N> = State<Arc<MarriageWorkflow<S, N>>>;

/// Router builder exposing registration, counseling, and calendar endpoints.
pub fn marriage_router<S, N>(workflow: Arc<MarriageWorkflow<S, N>>) -> Router
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/registrations", post(submit_handler::<S, N>))
        .route(
            "/api/v1/registrations/:registration_id",
            get(registration_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/flow",
            get(flow_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/form-review",
            post(form_review_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/document-review",
            post(document_review_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/visit",
            post(visit_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/officiant",
            post(assign_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/officiant/change",
            post(change_officiant_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/officiant-review",
            post(officiant_review_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/counseling/complete",
            post(complete_counseling_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/complete",
            post(complete_wedding_handler::<S, N>),
        )
        .route(
            "/api/v1/registrations/:registration_id/status",
            post(override_handler::<S, N>),
        )
        .route(
            "/api/v1/counseling/sessions",
            post(create_session_handler::<S, N>),
        )
        .route(
            "/api/v1/counseling/sessions/:session_id",
            patch(update_session_handler::<S, N>),
        )
        .route(
            "/api/v1/counseling/sessions/:session_id/cancel",
            post(cancel_session_handler::<S, N>),
        )
        .route(
            "/api/v1/counseling/sessions/:session_id/enrollments",
            post(enroll_handler::<S, N>),
        )
        .route(
            "/api/v1/counseling/sessions/:session_id/participants",
            get(participants_handler::<S, N>),
        )
        .route(
            "/api/v1/counseling/enrollments/:enrollment_id/attendance",
            put(attendance_handler::<S, N>),
        )
        .route(
            "/api/v1/calendar/weddings",
            get(wedding_month_handler::<S, N>),
        )
        .route(
            "/api/v1/calendar/weddings/:date",
            get(wedding_day_handler::<S, N>),
        )
        .route(
            "/api/v1/calendar/counseling",
            get(counseling_month_handler::<S, N>),
        )
        .route(
            "/api/v1/officiants/schedule",
            get(officiant_schedules_handler::<S, N>),
        )
        .route(
            "/api/v1/officiants/:officiant_id/slots",
            get(officiant_slots_handler::<S, N>),
        )
        .with_state(workflow)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    approved: bool,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRequest {
    officiant_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangeOfficiantRequest {
    officiant_id: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    status: String,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollRequest {
    registration_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MonthQuery {
    year: i32,
    month: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DateQuery {
    date: String,
}

/// Resolves the caller from the identity headers set by the gateway.
fn actor_from(headers: &HeaderMap) -> Result<Actor, Response> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let (Some(id), Some(role)) = (header(ACTOR_ID_HEADER), header(ACTOR_ROLE_HEADER)) else {
        let payload = json!({
            "error": "missing actor identity headers",
            "kind": "authentication",
        });
        return Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response());
    };

    match Role::from_label(role) {
        Some(role) => Ok(Actor::new(id, role)),
        None => {
            let payload = json!({
                "error": format!("unknown role '{role}'"),
                "kind": "authorization",
            });
            Err((StatusCode::FORBIDDEN, Json(payload)).into_response())
        }
    }
}

pub(crate) fn failure(error: WorkflowError) -> Response {
    let kind = error.kind();
    let mut payload = json!({
        "error": error.to_string(),
        "kind": kind.label(),
    });

    match &error {
        WorkflowError::Precondition { current, required } => {
            payload["current_status"] = json!(current.label());
            payload["required_status"] = json!(required.label());
        }
        WorkflowError::ActiveRegistrationExists { number } => {
            payload["registration_number"] = json!(number);
        }
        WorkflowError::Schedule(ScheduleConflict::OfficiantBusy {
            conflicting,
            conflicting_time,
            ..
        }) => {
            payload["conflicting_registration"] = json!(conflicting);
            payload["conflicting_time"] = json!(conflicting_time);
        }
        WorkflowError::Schedule(ScheduleConflict::VenueFull {
            capacity,
            scheduled,
            ..
        }) => {
            payload["capacity"] = json!(capacity);
            payload["scheduled"] = json!(scheduled);
        }
        _ => {}
    }

    (kind.status_code(), Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, WorkflowError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => failure(error),
    }
}

fn assignment_view(outcome: AssignmentOutcome) -> serde_json::Value {
    json!({
        "registration": outcome.registration.summary(),
        "officiant_day_count": outcome.check.officiant_day_count,
        "warning": outcome.check.warning,
    })
}

fn date_param(field: &str, raw: &str) -> Result<chrono::NaiveDate, WorkflowError> {
    parse_date(raw).ok_or_else(|| {
        ValidationError::InvalidDate {
            field: field.to_string(),
            value: raw.to_string(),
        }
        .into()
    })
}

macro_rules! actor_or_return {
    ($headers:expr) => {
        match actor_from(&$headers) {
            Ok(actor) => actor,
            Err(response) => return response,
        }
    };
}

pub(crate) async fn submit_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Json(submission): Json<RegistrationSubmission>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let result = workflow
        .registrations()
        .submit(&actor, submission)
        .map(|record| record.summary());
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn registration_handler<S, N>(
    State(workflow): Workflow<S, N>,
    Path(registration_id): Path<String>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let result = workflow
        .registrations()
        .get(&RegistrationId(registration_id))
        .map(|record| record.summary());
    respond(StatusCode::OK, result)
}

pub(crate) async fn flow_handler<S, N>(
    State(workflow): Workflow<S, N>,
    Path(registration_id): Path<String>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let result = workflow
        .registrations()
        .status_flow(&RegistrationId(registration_id));
    respond(StatusCode::OK, result)
}

fn decision(request: ReviewRequest) -> Result<ReviewDecision, WorkflowError> {
    Ok(ReviewDecision::from_flag(request.approved, request.note)?)
}

pub(crate) async fn form_review_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(registration_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let result = decision(request)
        .and_then(|decision| {
            workflow
                .registrations()
                .review_form(&actor, &RegistrationId(registration_id), decision)
        })
        .map(|record| record.summary());
    respond(StatusCode::OK, result)
}

pub(crate) async fn document_review_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(registration_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let result = decision(request)
        .and_then(|decision| {
            workflow.registrations().review_documents(
                &actor,
                &RegistrationId(registration_id),
                decision,
            )
        })
        .map(|record| record.summary());
    respond(StatusCode::OK, result)
}

pub(crate) async fn visit_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(registration_id): Path<String>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let result = workflow
        .registrations()
        .confirm_visit(&actor, &RegistrationId(registration_id))
        .map(|record| record.summary());
    respond(StatusCode::OK, result)
}

pub(crate) async fn assign_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(registration_id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let result = workflow
        .registrations()
        .assign_officiant(
            &actor,
            &RegistrationId(registration_id),
            &OfficiantId(request.officiant_id),
        )
        .map(assignment_view);
    respond(StatusCode::OK, result)
}

pub(crate) async fn change_officiant_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(registration_id): Path<String>,
    Json(request): Json<ChangeOfficiantRequest>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let result = workflow
        .registrations()
        .change_officiant(
            &actor,
            &RegistrationId(registration_id),
            &OfficiantId(request.officiant_id),
            request.reason,
        )
        .map(assignment_view);
    respond(StatusCode::OK, result)
}

pub(crate) async fn officiant_review_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(registration_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let result = decision(request)
        .and_then(|decision| {
            workflow.registrations().officiant_review(
                &actor,
                &RegistrationId(registration_id),
                decision,
            )
        })
        .map(|record| record.summary());
    respond(StatusCode::OK, result)
}

pub(crate) async fn complete_counseling_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(registration_id): Path<String>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let result = workflow
        .counseling()
        .complete_counseling(&actor, &RegistrationId(registration_id))
        .map(|record| record.summary());
    respond(StatusCode::OK, result)
}

pub(crate) async fn complete_wedding_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(registration_id): Path<String>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let result = workflow
        .registrations()
        .complete_wedding(&actor, &RegistrationId(registration_id))
        .map(|record| record.summary());
    respond(StatusCode::OK, result)
}

pub(crate) async fn override_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(registration_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    let Some(target) = RegistrationStatus::from_label(&request.status) else {
        return failure(
            ValidationError::InvalidChoice {
                field: "status".to_string(),
                value: request.status,
                allowed: "a registration status label",
            }
            .into(),
        );
    };
    let result = workflow
        .registrations()
        .override_status(
            &actor,
            &RegistrationId(registration_id),
            target,
            request.note,
        )
        .map(|record| record.summary());
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_session_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Json(draft): Json<SessionDraft>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    respond(
        StatusCode::CREATED,
        workflow.counseling().create_session(&actor, draft),
    )
}

pub(crate) async fn update_session_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(update): Json<SessionUpdate>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    respond(
        StatusCode::OK,
        workflow
            .counseling()
            .update_session(&actor, &SessionId(session_id), update),
    )
}

pub(crate) async fn cancel_session_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    respond(
        StatusCode::OK,
        workflow
            .counseling()
            .cancel_session(&actor, &SessionId(session_id)),
    )
}

pub(crate) async fn enroll_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(request): Json<EnrollRequest>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    respond(
        StatusCode::CREATED,
        workflow.counseling().enroll(
            &actor,
            &SessionId(session_id),
            &RegistrationId(request.registration_id),
        ),
    )
}

pub(crate) async fn participants_handler<S, N>(
    State(workflow): Workflow<S, N>,
    Path(session_id): Path<String>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    respond(
        StatusCode::OK,
        workflow.counseling().participants(&SessionId(session_id)),
    )
}

pub(crate) async fn attendance_handler<S, N>(
    State(workflow): Workflow<S, N>,
    headers: HeaderMap,
    Path(enrollment_id): Path<String>,
    Json(update): Json<AttendanceUpdate>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = actor_or_return!(headers);
    respond(
        StatusCode::OK,
        workflow
            .counseling()
            .update_attendance(&actor, &EnrollmentId(enrollment_id), update),
    )
}

pub(crate) async fn wedding_month_handler<S, N>(
    State(workflow): Workflow<S, N>,
    Query(query): Query<MonthQuery>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    respond(
        StatusCode::OK,
        workflow.agenda().wedding_month(query.year, query.month),
    )
}

pub(crate) async fn wedding_day_handler<S, N>(
    State(workflow): Workflow<S, N>,
    Path(date): Path<String>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let result = date_param("date", &date).and_then(|date| workflow.agenda().wedding_day(date));
    respond(StatusCode::OK, result)
}

pub(crate) async fn counseling_month_handler<S, N>(
    State(workflow): Workflow<S, N>,
    Query(query): Query<MonthQuery>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    respond(
        StatusCode::OK,
        workflow.agenda().counseling_month(query.year, query.month),
    )
}

pub(crate) async fn officiant_slots_handler<S, N>(
    State(workflow): Workflow<S, N>,
    Path(officiant_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let result = date_param("date", &query.date)
        .and_then(|date| workflow.agenda().officiant_slots(&OfficiantId(officiant_id), date));
    respond(StatusCode::OK, result)
}

pub(crate) async fn officiant_schedules_handler<S, N>(
    State(workflow): Workflow<S, N>,
    Query(query): Query<DateQuery>,
) -> Response
where
    S: RegistryStore + 'static,
    N: NotificationSink + 'static,
{
    let result =
        date_param("date", &query.date).and_then(|date| workflow.agenda().officiant_schedules(date));
    respond(StatusCode::OK, result)
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::appointments::{AppointmentId, BookingRequest, StatusChange};
use super::domain::{AgentId, ContactId, LeaseToken};
use super::qualification::QualificationRequest;
use super::repository::{AgentDirectory, AppointmentStore, ContactStore, PipelineNotifier};
use super::scoring::Priority;
use super::service::{ProspectingError, ProspectingService};

type SharedService<S, D, P, N> = Arc<ProspectingService<S, D, P, N>>;

const QUEUE_PREVIEW_LIMIT: usize = 25;

#[derive(Debug, Deserialize)]
pub(crate) struct NextContactRequest {
    pub(crate) agent_id: AgentId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AbandonRequest {
    pub(crate) agent_id: AgentId,
    pub(crate) lease_token: LeaseToken,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteRequest {
    pub(crate) agent_id: AgentId,
    #[serde(default)]
    pub(crate) note: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppointmentStatusRequest {
    pub(crate) actor: AgentId,
    #[serde(flatten)]
    pub(crate) change: StatusChange,
}

#[derive(Debug, Serialize)]
struct ScoreView {
    contact_id: ContactId,
    completeness: u8,
    engagement: u8,
    potential: u8,
    timing: u8,
    total: u8,
    category: &'static str,
    priority: Priority,
}

/// Router builder exposing the work queue, qualification, and appointment endpoints.
pub fn prospecting_router<S, D, P, N>(service: SharedService<S, D, P, N>) -> Router
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    Router::new()
        .route("/api/v1/queue/next", post(next_contact_handler::<S, D, P, N>))
        .route(
            "/api/v1/agents/:agent_id/queue",
            get(queue_preview_handler::<S, D, P, N>),
        )
        .route(
            "/api/v1/contacts/:contact_id/lease/abandon",
            post(abandon_handler::<S, D, P, N>),
        )
        .route(
            "/api/v1/contacts/:contact_id/qualify",
            post(qualify_handler::<S, D, P, N>),
        )
        .route(
            "/api/v1/contacts/:contact_id/notes",
            post(note_handler::<S, D, P, N>),
        )
        .route(
            "/api/v1/contacts/:contact_id/score",
            get(score_handler::<S, D, P, N>),
        )
        .route(
            "/api/v1/contacts/:contact_id/timeline",
            get(timeline_handler::<S, D, P, N>),
        )
        .route(
            "/api/v1/appointments",
            post(book_appointment_handler::<S, D, P, N>),
        )
        .route(
            "/api/v1/appointments/:appointment_id/status",
            post(appointment_status_handler::<S, D, P, N>),
        )
        .route(
            "/api/v1/appointments/:appointment_id/history",
            get(appointment_history_handler::<S, D, P, N>),
        )
        .with_state(service)
}

pub(crate) fn error_response(error: ProspectingError) -> Response {
    let (status, payload) = match &error {
        ProspectingError::Validation(validation) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": validation.to_string(), "field": validation.field() }),
        ),
        ProspectingError::ContactExcluded => (
            StatusCode::FORBIDDEN,
            json!({ "error": error.to_string() }),
        ),
        ProspectingError::UnknownAgent(_) => (
            StatusCode::FORBIDDEN,
            json!({ "error": error.to_string() }),
        ),
        ProspectingError::DuplicateAppointment(_) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "retryable": false }),
        ),
        ProspectingError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string() }),
        ),
        ProspectingError::LeaseConflict => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "retryable": true }),
        ),
        ProspectingError::StoreUnavailable(reason) => {
            warn!(reason = %reason, "store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": error.to_string(), "retryable": true }),
            )
        }
    };

    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn next_contact_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    axum::Json(request): axum::Json<NextContactRequest>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    match service.request_next_contact(&request.agent_id, Utc::now()) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queue_preview_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    Path(agent_id): Path<String>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    match service.ranked_queue(&AgentId(agent_id), Utc::now(), QUEUE_PREVIEW_LIMIT) {
        Ok(queue) => (StatusCode::OK, axum::Json(json!({ "queue": queue }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn abandon_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    Path(contact_id): Path<String>,
    axum::Json(request): axum::Json<AbandonRequest>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    match service.abandon_lease(
        &ContactId(contact_id),
        &request.agent_id,
        &request.lease_token,
    ) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn qualify_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    Path(contact_id): Path<String>,
    axum::Json(request): axum::Json<QualificationRequest>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    match service.qualify(&ContactId(contact_id), &request, Utc::now()) {
        Ok(contact) => (StatusCode::OK, axum::Json(contact)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn note_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    Path(contact_id): Path<String>,
    axum::Json(request): axum::Json<NoteRequest>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    match service.record_note(
        &ContactId(contact_id),
        &request.agent_id,
        &request.note,
        Utc::now(),
    ) {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    Path(contact_id): Path<String>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    let contact_id = ContactId(contact_id);
    match service.score_contact(&contact_id, Utc::now()) {
        Ok(score) => {
            let view = ScoreView {
                contact_id,
                completeness: score.completeness,
                engagement: score.engagement,
                potential: score.potential,
                timing: score.timing,
                total: score.total,
                category: score.category.label(),
                priority: score.priority(),
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn timeline_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    Path(contact_id): Path<String>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    match service.contact_timeline(&ContactId(contact_id)) {
        Ok(timeline) => (StatusCode::OK, axum::Json(timeline)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn book_appointment_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    axum::Json(request): axum::Json<BookingRequest>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    match service.book_appointment(&request, Utc::now()) {
        Ok(appointment) => (StatusCode::CREATED, axum::Json(appointment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn appointment_status_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    Path(appointment_id): Path<String>,
    axum::Json(request): axum::Json<AppointmentStatusRequest>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    match service.change_appointment_status(
        &AppointmentId(appointment_id),
        &request.change,
        &request.actor,
        Utc::now(),
    ) {
        Ok(appointment) => (StatusCode::OK, axum::Json(appointment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn appointment_history_handler<S, D, P, N>(
    State(service): State<SharedService<S, D, P, N>>,
    Path(appointment_id): Path<String>,
) -> Response
where
    S: ContactStore + 'static,
    D: AgentDirectory + 'static,
    P: AppointmentStore + 'static,
    N: PipelineNotifier + 'static,
{
    match service.appointment_history(&AppointmentId(appointment_id)) {
        Ok(history) => (StatusCode::OK, axum::Json(json!({ "history": history }))).into_response(),
        Err(error) => error_response(error),
    }
}

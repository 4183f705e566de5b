use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{InterpreterId, JobId, JobStatus, NewClientRequest};
use super::repository::{SchedulingRepository, StatusAuditSink};
use super::service::{SchedulingError, SchedulingService};

/// Router builder exposing matching, outreach, and lifecycle endpoints for jobs.
pub fn scheduling_router<R, A>(service: Arc<SchedulingService<R, A>>) -> Router
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    Router::new()
        .route("/api/v1/jobs/:job_id", get(job_handler::<R, A>))
        .route("/api/v1/jobs/:job_id/matches", get(matches_handler::<R, A>))
        .route("/api/v1/jobs/:job_id/outreach", get(outreach_handler::<R, A>))
        .route(
            "/api/v1/jobs/:job_id/attempts/:interpreter_id",
            delete(undo_attempt_handler::<R, A>),
        )
        .route(
            "/api/v1/jobs/:job_id/attempts/:interpreter_id/:action",
            post(attempt_handler::<R, A>),
        )
        .route(
            "/api/v1/jobs/:job_id/assignment",
            put(assign_handler::<R, A>).delete(unassign_handler::<R, A>),
        )
        .route("/api/v1/jobs/:job_id/status", put(status_handler::<R, A>))
        .route(
            "/api/v1/jobs/:job_id/status-history",
            get(history_handler::<R, A>),
        )
        .route(
            "/api/v1/jobs/:job_id/client-requests",
            post(client_request_handler::<R, A>),
        )
        .route(
            "/api/v1/jobs/:job_id/client-requests/preview",
            get(client_request_preview_handler::<R, A>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AttemptNotes {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentRequest {
    pub interpreter_id: InterpreterId,
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UnassignmentRequest {
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChangeRequest {
    pub status: JobStatus,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClientRequestSubmission {
    pub request: NewClientRequest,
    #[serde(default)]
    pub confirm_duration_change: bool,
}

pub(crate) async fn job_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    match service.job_details(&JobId(job_id)) {
        Ok(details) => (StatusCode::OK, axum::Json(details)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn matches_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    match service.compute_matches(&JobId(job_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn outreach_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    match service.outreach_board(&JobId(job_id)) {
        Ok(board) => (StatusCode::OK, axum::Json(board)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn attempt_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path((job_id, interpreter_id, action)): Path<(String, String, String)>,
    body: Option<axum::Json<AttemptNotes>>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    let job_id = JobId(job_id);
    let interpreter_id = InterpreterId(interpreter_id);
    let notes = body.and_then(|axum::Json(body)| body.notes);

    let result = match action.as_str() {
        "contacted" => service.mark_contacted(&job_id, &interpreter_id, notes),
        "pending" => service.mark_pending(&job_id, &interpreter_id, notes),
        "declined" => service.mark_declined(&job_id, &interpreter_id, notes),
        "confirmed" => {
            return match service.mark_confirmed(&job_id, &interpreter_id, notes) {
                Ok(confirmation) => (StatusCode::OK, axum::Json(confirmation)).into_response(),
                Err(err) => error_response(err),
            };
        }
        other => {
            let payload = json!({
                "error": format!("unknown outreach action '{other}'"),
            });
            return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
        }
    };

    match result {
        Ok(attempt) => (StatusCode::OK, axum::Json(attempt)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn undo_attempt_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path((job_id, interpreter_id)): Path<(String, String)>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    match service.undo_attempt(&JobId(job_id), &InterpreterId(interpreter_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn assign_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<AssignmentRequest>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    match service.assign_interpreter(
        &JobId(job_id),
        &request.interpreter_id,
        request.actor.as_deref(),
    ) {
        Ok(update) => (StatusCode::OK, axum::Json(update)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn unassign_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path(job_id): Path<String>,
    body: Option<axum::Json<UnassignmentRequest>>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    let actor = body.and_then(|axum::Json(body)| body.actor);
    match service.unassign_interpreter(&JobId(job_id), actor.as_deref()) {
        Ok(update) => (StatusCode::OK, axum::Json(update)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<StatusChangeRequest>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    match service.set_status(&JobId(job_id), request.status, &request.actor) {
        Ok(update) => (StatusCode::OK, axum::Json(update)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn history_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    match service.status_history(&JobId(job_id)) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn client_request_preview_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    let job_id = JobId(job_id);
    match service.preview_client_request(&job_id) {
        Ok(adjustment) => {
            let payload = json!({
                "job_id": job_id,
                "requires_confirmation": adjustment.is_some(),
                "warning": adjustment.map(|adjustment| adjustment.warning()),
                "adjustment": adjustment,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn client_request_handler<R, A>(
    State(service): State<Arc<SchedulingService<R, A>>>,
    Path(job_id): Path<String>,
    axum::Json(submission): axum::Json<ClientRequestSubmission>,
) -> Response
where
    R: SchedulingRepository + 'static,
    A: StatusAuditSink + 'static,
{
    match service.add_client_request(
        &JobId(job_id),
        submission.request,
        submission.confirm_duration_change,
    ) {
        Ok(request) => (StatusCode::CREATED, axum::Json(request)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: SchedulingError) -> Response {
    let status = match &err {
        SchedulingError::NotFound { .. } => StatusCode::NOT_FOUND,
        SchedulingError::PreconditionFailed(_) => StatusCode::CONFLICT,
        SchedulingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SchedulingError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{SupportForm, SupportRequestId, SupportStatus};
use super::repository::SupportRepository;
use super::service::{SupportError, SupportService};
use crate::workflows::identity::Actor;
use crate::workflows::lifecycle::router::identity_error_response;

#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
    pub request_ids: Vec<SupportRequestId>,
    pub status: SupportStatus,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePayload {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupportListQuery {
    pub status: Option<SupportStatus>,
}

pub fn support_router<R>(service: Arc<SupportService<R>>) -> Router
where
    R: SupportRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/support",
            post(submit_handler::<R>).get(list_handler::<R>),
        )
        .route("/api/v1/support/status", post(status_handler::<R>))
        .route(
            "/api/v1/support/:request_id/respond",
            post(respond_handler::<R>),
        )
        .with_state(service)
}

fn support_error_response(error: SupportError) -> Response {
    let status = match &error {
        SupportError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SupportError::NotFound(_) => StatusCode::NOT_FOUND,
        SupportError::Conflict(_) => StatusCode::CONFLICT,
        SupportError::Repository(_) => {
            tracing::error!(error = %error, "support store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn staff_only(headers: &HeaderMap) -> Result<Actor, Response> {
    match Actor::from_headers(headers) {
        Ok(actor) if actor.is_staff() => Ok(actor),
        Ok(_) => {
            let payload = json!({ "error": "not allowed to manage support requests" });
            Err((StatusCode::FORBIDDEN, Json(payload)).into_response())
        }
        Err(error) => Err(identity_error_response(error)),
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<SupportService<R>>>,
    headers: HeaderMap,
    Json(form): Json<SupportForm>,
) -> Response
where
    R: SupportRepository + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    match service.submit(form, &actor) {
        Ok(request) => {
            let payload = json!({
                "success": true,
                "message": "Your request has been sent. We will reply soon.",
                "request": request,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(error) => support_error_response(error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<SupportService<R>>>,
    headers: HeaderMap,
    Query(query): Query<SupportListQuery>,
) -> Response
where
    R: SupportRepository + 'static,
{
    if let Err(response) = staff_only(&headers) {
        return response;
    }
    match service.requests(query.status) {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(error) => support_error_response(error),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<SupportService<R>>>,
    headers: HeaderMap,
    Json(payload): Json<StatusUpdatePayload>,
) -> Response
where
    R: SupportRepository + 'static,
{
    if let Err(response) = staff_only(&headers) {
        return response;
    }
    match service.update_status(&payload.request_ids, payload.status) {
        Ok(requests) => (StatusCode::OK, Json(json!({ "updated": requests }))).into_response(),
        Err(error) => support_error_response(error),
    }
}

pub(crate) async fn respond_handler<R>(
    State(service): State<Arc<SupportService<R>>>,
    headers: HeaderMap,
    Path(request_id): Path<u64>,
    Json(payload): Json<ResponsePayload>,
) -> Response
where
    R: SupportRepository + 'static,
{
    if let Err(response) = staff_only(&headers) {
        return response;
    }
    match service.respond(SupportRequestId(request_id), &payload.response) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(error) => support_error_response(error),
    }
}

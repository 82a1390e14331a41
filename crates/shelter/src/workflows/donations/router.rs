use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{DonationForm, DonationId, PaymentStatus};
use super::repository::DonationRepository;
use super::service::{DonationError, DonationService};
use crate::workflows::accounts::repository::UserRepository;
use crate::workflows::identity::Actor;
use crate::workflows::lifecycle::router::identity_error_response;

#[derive(Debug, Deserialize)]
pub struct PaymentUpdatePayload {
    pub donation_ids: Vec<DonationId>,
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DonationListQuery {
    pub status: Option<PaymentStatus>,
}

pub fn donation_router<D, U>(service: Arc<DonationService<D, U>>) -> Router
where
    D: DonationRepository + 'static,
    U: UserRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/donations",
            post(donate_handler::<D, U>).get(list_handler::<D, U>),
        )
        .route("/api/v1/donations/top", get(top_donors_handler::<D, U>))
        .route("/api/v1/donations/status", post(payment_handler::<D, U>))
        .with_state(service)
}

fn donation_error_response(error: DonationError) -> Response {
    let status = match &error {
        DonationError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DonationError::NotFound(_) => StatusCode::NOT_FOUND,
        DonationError::Conflict(_) => StatusCode::CONFLICT,
        DonationError::Repository(_) => {
            tracing::error!(error = %error, "donation store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn forbidden(action: &str) -> Response {
    let payload = json!({ "error": format!("not allowed to {action}") });
    (StatusCode::FORBIDDEN, Json(payload)).into_response()
}

pub(crate) async fn donate_handler<D, U>(
    State(service): State<Arc<DonationService<D, U>>>,
    headers: HeaderMap,
    Json(form): Json<DonationForm>,
) -> Response
where
    D: DonationRepository + 'static,
    U: UserRepository + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let result = service.donate(form, &actor).and_then(|donation| {
        let donor = service.donor_name(&donation)?;
        Ok(json!({
            "success": true,
            "message": "Thank you for your support!",
            "donor": donor,
            "donation": donation,
        }))
    });
    match result {
        Ok(payload) => (StatusCode::CREATED, Json(payload)).into_response(),
        Err(error) => donation_error_response(error),
    }
}

pub(crate) async fn list_handler<D, U>(
    State(service): State<Arc<DonationService<D, U>>>,
    headers: HeaderMap,
    Query(query): Query<DonationListQuery>,
) -> Response
where
    D: DonationRepository + 'static,
    U: UserRepository + 'static,
{
    match Actor::from_headers(&headers) {
        Ok(actor) if actor.is_staff() => {}
        Ok(_) => return forbidden("list donations"),
        Err(error) => return identity_error_response(error),
    }
    match service.donations(query.status) {
        Ok(donations) => (StatusCode::OK, Json(donations)).into_response(),
        Err(error) => donation_error_response(error),
    }
}

pub(crate) async fn top_donors_handler<D, U>(
    State(service): State<Arc<DonationService<D, U>>>,
) -> Response
where
    D: DonationRepository + 'static,
    U: UserRepository + 'static,
{
    match service.top_donors() {
        Ok(donors) => (StatusCode::OK, Json(json!({ "top_donors": donors }))).into_response(),
        Err(error) => donation_error_response(error),
    }
}

pub(crate) async fn payment_handler<D, U>(
    State(service): State<Arc<DonationService<D, U>>>,
    headers: HeaderMap,
    Json(payload): Json<PaymentUpdatePayload>,
) -> Response
where
    D: DonationRepository + 'static,
    U: UserRepository + 'static,
{
    match Actor::from_headers(&headers) {
        Ok(actor) if actor.is_staff() => {}
        Ok(_) => return forbidden("settle donation payments"),
        Err(error) => return identity_error_response(error),
    }
    match service.update_payment_status(
        &payload.donation_ids,
        payload.status,
        payload.transaction_id.as_deref(),
    ) {
        Ok(updated) => (StatusCode::OK, Json(json!({ "updated": updated }))).into_response(),
        Err(error) => donation_error_response(error),
    }
}

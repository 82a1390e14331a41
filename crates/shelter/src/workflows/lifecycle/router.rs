use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    AdoptionId, AnimalId, AnimalIntake, AnimalStatus, ReservationId, VisitorInfo,
};
use super::service::{AnimalLifecycleService, LifecycleError};
use super::store::LifecycleStore;
use crate::workflows::identity::{Actor, IdentityError};

#[derive(Debug, Deserialize)]
pub struct ReservationPayload {
    pub animal_id: AnimalId,
    pub visit_date: NaiveDate,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct AdoptionPayload {
    pub animal_id: AnimalId,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusOverridePayload {
    pub animal_ids: Vec<AnimalId>,
    pub status: AnimalStatus,
}

/// Router builder exposing the reservation and adoption workflow.
pub fn lifecycle_router<S>(service: Arc<AnimalLifecycleService<S>>) -> Router
where
    S: LifecycleStore + 'static,
{
    Router::new()
        .route("/api/v1/animals/intake", post(register_handler::<S>))
        .route("/api/v1/animals/status", post(override_handler::<S>))
        .route(
            "/api/v1/animals/:animal_id/availability",
            get(availability_handler::<S>),
        )
        .route("/api/v1/reservations", post(reserve_handler::<S>))
        .route(
            "/api/v1/reservations/:reservation_id",
            get(reservation_handler::<S>),
        )
        .route(
            "/api/v1/reservations/:reservation_id/cancel",
            post(cancel_handler::<S>),
        )
        .route(
            "/api/v1/reservations/:reservation_id/confirm",
            post(confirm_handler::<S>),
        )
        .route("/api/v1/adoptions", post(adoption_handler::<S>))
        .route(
            "/api/v1/adoptions/:adoption_id",
            get(adoption_status_handler::<S>),
        )
        .route(
            "/api/v1/adoptions/:adoption_id/approve",
            post(approve_handler::<S>),
        )
        .route(
            "/api/v1/adoptions/:adoption_id/reject",
            post(reject_handler::<S>),
        )
        .route(
            "/api/v1/adoptions/:adoption_id/complete",
            post(complete_handler::<S>),
        )
        .with_state(service)
}

pub(crate) fn identity_error_response(error: IdentityError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

pub(crate) fn lifecycle_error_response(error: LifecycleError) -> Response {
    let status = match &error {
        LifecycleError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::Conflict(_) => StatusCode::CONFLICT,
        LifecycleError::NotFound { .. } => StatusCode::NOT_FOUND,
        LifecycleError::Authorization(_) => StatusCode::FORBIDDEN,
        LifecycleError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "lifecycle store failure");
    }
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn require_staff(actor: &Actor, action: &'static str) -> Result<(), LifecycleError> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(LifecycleError::Authorization(action))
    }
}

fn respond<T: serde::Serialize>(
    result: Result<T, LifecycleError>,
    success: StatusCode,
) -> Response {
    match result {
        Ok(body) => (success, Json(body)).into_response(),
        Err(error) => lifecycle_error_response(error),
    }
}

pub(crate) async fn register_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Json(intake): Json<AnimalIntake>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let result =
        require_staff(&actor, "register animals").and_then(|()| service.register_animal(intake));
    respond(result, StatusCode::CREATED)
}

pub(crate) async fn override_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Json(payload): Json<StatusOverridePayload>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let result = require_staff(&actor, "override animal statuses")
        .and_then(|()| service.override_status(&payload.animal_ids, payload.status));
    respond(result, StatusCode::OK)
}

pub(crate) async fn availability_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    Path(animal_id): Path<u64>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    respond(
        service.check_availability(AnimalId(animal_id)),
        StatusCode::OK,
    )
}

pub(crate) async fn reserve_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Json(payload): Json<ReservationPayload>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let ReservationPayload {
        animal_id,
        visit_date,
        name,
        phone,
        email,
        comment,
    } = payload;
    let visitor = VisitorInfo {
        user_id: actor.user_id,
        name,
        phone,
        email,
        comment,
    };
    respond(
        service.request_reservation(animal_id, visitor, visit_date),
        StatusCode::CREATED,
    )
}

pub(crate) async fn reservation_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Path(reservation_id): Path<u64>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let result = service
        .reservation(ReservationId(reservation_id))
        .and_then(|reservation| {
            if actor.can_act_for(reservation.user_id) {
                Ok(reservation)
            } else {
                Err(LifecycleError::Authorization("view this reservation"))
            }
        });
    respond(result, StatusCode::OK)
}

pub(crate) async fn cancel_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Path(reservation_id): Path<u64>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    match service.cancel_reservation(ReservationId(reservation_id), &actor) {
        Ok(reservation) => {
            let payload = json!({
                "success": true,
                "message": "Reservation cancelled",
                "reservation": reservation,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => lifecycle_error_response(error),
    }
}

pub(crate) async fn confirm_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Path(reservation_id): Path<u64>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let result = require_staff(&actor, "confirm reservations")
        .and_then(|()| service.confirm_reservation(ReservationId(reservation_id)));
    respond(result, StatusCode::OK)
}

pub(crate) async fn adoption_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Json(payload): Json<AdoptionPayload>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    respond(
        service.submit_adoption(payload.animal_id, &actor, &payload.notes),
        StatusCode::CREATED,
    )
}

pub(crate) async fn adoption_status_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Path(adoption_id): Path<u64>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let result = service
        .adoption(AdoptionId(adoption_id))
        .and_then(|adoption| {
            if actor.can_act_for(Some(adoption.user_id)) {
                Ok(adoption)
            } else {
                Err(LifecycleError::Authorization("view this adoption"))
            }
        });
    respond(result, StatusCode::OK)
}

pub(crate) async fn approve_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Path(adoption_id): Path<u64>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let result = require_staff(&actor, "approve adoptions")
        .and_then(|()| service.approve_adoption(AdoptionId(adoption_id)));
    respond(result, StatusCode::OK)
}

pub(crate) async fn reject_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Path(adoption_id): Path<u64>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let result = require_staff(&actor, "reject adoptions")
        .and_then(|()| service.reject_adoption(AdoptionId(adoption_id)));
    respond(result, StatusCode::OK)
}

pub(crate) async fn complete_handler<S>(
    State(service): State<Arc<AnimalLifecycleService<S>>>,
    headers: HeaderMap,
    Path(adoption_id): Path<u64>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    let actor = match Actor::from_headers(&headers) {
        Ok(actor) => actor,
        Err(error) => return identity_error_response(error),
    };
    let result = require_staff(&actor, "complete adoptions")
        .and_then(|()| service.complete_adoption(AdoptionId(adoption_id)));
    respond(result, StatusCode::OK)
}

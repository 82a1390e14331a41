use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    Json,
};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::identity::{ROLE_HEADER, USER_HEADER};
use crate::workflows::lifecycle::domain::{AnimalId, AnimalKind, AnimalStatus};
use crate::workflows::lifecycle::router::{
    approve_handler, availability_handler, cancel_handler, lifecycle_router, register_handler,
    reserve_handler, ReservationPayload,
};
use crate::workflows::lifecycle::store::InMemoryLifecycleStore;
use crate::workflows::lifecycle::AnimalLifecycleService;

fn visitor_headers(user: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_HEADER, HeaderValue::from_str(&user.to_string()).unwrap());
    headers
}

fn staff_headers(user: u64) -> HeaderMap {
    let mut headers = visitor_headers(user);
    headers.insert(ROLE_HEADER, HeaderValue::from_static("staff"));
    headers
}

fn payload(animal_id: AnimalId) -> ReservationPayload {
    ReservationPayload {
        animal_id,
        visit_date: tomorrow(),
        name: "Anna".to_string(),
        phone: "+79161234567".to_string(),
        email: "anna@example.org".to_string(),
        comment: String::new(),
    }
}

fn shared() -> Arc<AnimalLifecycleService<InMemoryLifecycleStore>> {
    Arc::new(build_service().0)
}

#[tokio::test]
async fn reserve_then_conflict_maps_to_409() {
    let service = shared();
    let animal = register(&service, "Rex");

    let created = reserve_handler::<InMemoryLifecycleStore>(
        State(service.clone()),
        visitor_headers(1),
        Json(payload(animal.id)),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json_body(created).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["user_id"], 1);

    let conflict = reserve_handler::<InMemoryLifecycleStore>(
        State(service.clone()),
        visitor_headers(2),
        Json(payload(animal.id)),
    )
    .await;
    assert_eq!(conflict.status(), StatusCode::CONFLICT);
    let body = read_json_body(conflict).await;
    assert!(body["error"].as_str().unwrap().contains("cannot be reserved"));
}

#[tokio::test]
async fn cancel_reports_success_message() {
    let service = shared();
    let animal = register(&service, "Rex");
    let created = reserve_handler::<InMemoryLifecycleStore>(
        State(service.clone()),
        visitor_headers(1),
        Json(payload(animal.id)),
    )
    .await;
    let reservation_id = read_json_body(created).await["id"].as_u64().unwrap();

    let forbidden = cancel_handler::<InMemoryLifecycleStore>(
        State(service.clone()),
        visitor_headers(2),
        Path(reservation_id),
    )
    .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let response = cancel_handler::<InMemoryLifecycleStore>(
        State(service.clone()),
        visitor_headers(1),
        Path(reservation_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Reservation cancelled");
    assert_eq!(body["reservation"]["status"], "cancelled");

    let availability =
        availability_handler::<InMemoryLifecycleStore>(State(service), Path(animal.id.0)).await;
    let body = read_json_body(availability).await;
    assert_eq!(body["available"], true);
    assert_eq!(body["status_label"], "In the shelter");
}

#[tokio::test]
async fn past_visit_date_maps_to_422() {
    let service = shared();
    let animal = register(&service, "Rex");
    let mut request = payload(animal.id);
    request.visit_date = today().pred_opt().unwrap();

    let response =
        reserve_handler::<InMemoryLifecycleStore>(State(service), HeaderMap::new(), Json(request))
            .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("visit_date"));
}

#[tokio::test]
async fn unknown_animal_maps_to_404() {
    let response =
        availability_handler::<InMemoryLifecycleStore>(State(shared()), Path(999)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_operations_require_staff_role() {
    let service = shared();
    let animal = register(&service, "Rex");
    let adoption = service
        .submit_adoption(
            animal.id,
            &crate::workflows::identity::Actor::visitor(crate::workflows::identity::UserId(4)),
            "",
        )
        .unwrap();

    let denied = approve_handler::<InMemoryLifecycleStore>(
        State(service.clone()),
        visitor_headers(4),
        Path(adoption.id.0),
    )
    .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let approved = approve_handler::<InMemoryLifecycleStore>(
        State(service.clone()),
        staff_headers(9),
        Path(adoption.id.0),
    )
    .await;
    assert_eq!(approved.status(), StatusCode::OK);
    assert_eq!(service.animal(animal.id).unwrap().status, AnimalStatus::Adopted);

    let again = approve_handler::<InMemoryLifecycleStore>(
        State(service),
        staff_headers(9),
        Path(adoption.id.0),
    )
    .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_identity_headers_are_unauthorized() {
    let mut headers = HeaderMap::new();
    headers.insert(USER_HEADER, HeaderValue::from_static("not-a-number"));

    let response = register_handler::<InMemoryLifecycleStore>(
        State(shared()),
        headers,
        Json(intake("Rex", AnimalKind::Cat)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn router_registers_animals_for_staff() {
    let app = lifecycle_router(shared());
    let body = serde_json::to_vec(&json!({
        "name": "Murka",
        "animal_type": "cat",
        "age": "young",
        "gender": "female",
        "size": "small",
        "description": "Playful kitten",
    }))
    .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/animals/intake")
        .header("content-type", "application/json")
        .header(USER_HEADER, "7")
        .header(ROLE_HEADER, "staff")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    assert_eq!(created["status"], "available");
    assert_eq!(created["animal_type"], "cat");

    let availability = Request::builder()
        .uri(format!(
            "/api/v1/animals/{}/availability",
            created["id"].as_u64().unwrap()
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(availability).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn router_rejects_status_override_from_visitors() {
    let service = shared();
    let animal = register(&service, "Rex");
    let app = lifecycle_router(service);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/animals/status")
        .header("content-type", "application/json")
        .header(USER_HEADER, "3")
        .body(Body::from(
            serde_json::to_vec(&json!({ "animal_ids": [animal.id.0], "status": "adopted" }))
                .unwrap(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

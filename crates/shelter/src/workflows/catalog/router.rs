use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::filter::CatalogQuery;
use super::service::{CatalogError, CatalogService};
use crate::workflows::lifecycle::domain::AnimalId;
use crate::workflows::lifecycle::store::LifecycleStore;

pub fn catalog_router<S>(service: Arc<CatalogService<S>>) -> Router
where
    S: LifecycleStore + 'static,
{
    Router::new()
        .route("/api/v1/animals", get(list_handler::<S>))
        .route("/api/v1/animals/featured", get(featured_handler::<S>))
        .route("/api/v1/animals/stats", get(stats_handler::<S>))
        .route("/api/v1/animals/:animal_id", get(detail_handler::<S>))
        .with_state(service)
}

fn catalog_error_response(error: CatalogError) -> Response {
    let status = match &error {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Repository(_) => {
            tracing::error!(error = %error, "catalog store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    Query(query): Query<CatalogQuery>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    match service.list_animals(&query) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => catalog_error_response(error),
    }
}

pub(crate) async fn featured_handler<S>(State(service): State<Arc<CatalogService<S>>>) -> Response
where
    S: LifecycleStore + 'static,
{
    match service.featured() {
        Ok(animals) => (StatusCode::OK, Json(json!({ "animals": animals }))).into_response(),
        Err(error) => catalog_error_response(error),
    }
}

pub(crate) async fn stats_handler<S>(State(service): State<Arc<CatalogService<S>>>) -> Response
where
    S: LifecycleStore + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(error) => catalog_error_response(error),
    }
}

pub(crate) async fn detail_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    Path(animal_id): Path<u64>,
) -> Response
where
    S: LifecycleStore + 'static,
{
    match service.animal_detail(AnimalId(animal_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(error) => catalog_error_response(error),
    }
}

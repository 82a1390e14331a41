use crate::infra::{AppState, ShelterServices};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use shelter::workflows::accounts::account_router;
use shelter::workflows::catalog::catalog_router;
use shelter::workflows::donations::donation_router;
use shelter::workflows::lifecycle::lifecycle_router;
use shelter::workflows::support::support_router;

/// Every workflow router plus the service probes.
pub(crate) fn with_shelter_routes(services: &ShelterServices) -> Router {
    Router::new()
        .merge(catalog_router(services.catalog.clone()))
        .merge(lifecycle_router(services.lifecycle.clone()))
        .merge(account_router(services.accounts.clone()))
        .merge(support_router(services.support.clone()))
        .merge(donation_router(services.donations.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use shelter::config::ShelterConfig;
    use shelter::workflows::clock::FixedClock;
    use shelter::workflows::identity::{ROLE_HEADER, USER_HEADER};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn services() -> ShelterServices {
        let day = NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date");
        ShelterServices::in_memory(&ShelterConfig::default(), Arc::new(FixedClock::on(day)))
    }

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.expect("router responds");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let services = services();
        let initializing = with_shelter_routes(&services).layer(Extension(state(false)));
        let (status, body) = call(&initializing, get_request("/ready")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        let ready = with_shelter_routes(&services).layer(Extension(state(true)));
        let (status, _) = call(&ready, get_request("/ready")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&ready, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn merged_routes_reach_every_workflow() {
        let services = services();
        services.seed_demo_animals().expect("seed");
        let app = with_shelter_routes(&services).layer(Extension(state(true)));

        let (status, listing) = call(&app, get_request("/api/v1/animals?animal_type=dog")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing["total"], 3);

        let (status, featured) = call(&app, get_request("/api/v1/animals/featured")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(featured["animals"].as_array().map(Vec::len), Some(5));

        let animal_id = listing["items"][0]["id"].as_u64().expect("animal id");
        let (status, detail) = call(&app, get_request(&format!("/api/v1/animals/{animal_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["similar"].as_array().map(Vec::len), Some(2));

        let (status, availability) = call(
            &app,
            get_request(&format!("/api/v1/animals/{animal_id}/availability")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(availability["available"], true);

        let (status, top) = call(&app, get_request("/api/v1/donations/top")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(top["top_donors"], serde_json::json!([]));

        let staff_listing = Request::builder()
            .uri("/api/v1/support")
            .header(USER_HEADER, "1")
            .header(ROLE_HEADER, "staff")
            .body(Body::empty())
            .expect("request");
        let (status, _) = call(&app, staff_listing).await;
        assert_eq!(status, StatusCode::OK);
    }
}

use crate::cli::ServeArgs;
use crate::infra::{AppState, ShelterServices};
use crate::routes::with_shelter_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use shelter::config::AppConfig;
use shelter::error::AppError;
use shelter::telemetry;
use shelter::workflows::clock::SystemClock;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if args.seed_demo {
        config.shelter.seed_demo_animals = true;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = ShelterServices::in_memory(&config.shelter, Arc::new(SystemClock));
    if config.shelter.seed_demo_animals {
        let seeded = services.seed_demo_animals()?;
        info!(seeded, "demo animals registered");
    }

    let app = with_shelter_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        page_size = config.shelter.page_size,
        "shelter records service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

use crate::cli::ServeArgs;
use crate::infra::{seed_demo_data, AppState, TracingMailer};
use crate::routes::with_rental_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rentwell::config::AppConfig;
use rentwell::error::AppError;
use rentwell::rentals::memory::InMemoryRentalStore;
use rentwell::rentals::router::RentalApi;
use rentwell::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = InMemoryRentalStore::default();
    seed_demo_data(&store);
    let api = Arc::new(RentalApi::new(
        Arc::new(store),
        Arc::new(TracingMailer),
        config.notifications.upcoming_window_days,
        config.notifications.scheduler_token.clone(),
    ));

    let app = with_rental_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "rental marketplace service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

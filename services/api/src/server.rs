use crate::cli::ServeArgs;
use crate::infra::{build_monitoring_service, AppState};
use crate::routes::with_monitoring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use ops_monitor::config::AppConfig;
use ops_monitor::error::AppError;
use ops_monitor::telemetry;
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
    let app_state = AppState::new(prometheus_handle);

    let (service, _alerts) = build_monitoring_service(&config.monitoring);

    let app = with_monitoring_routes(service)
        .layer(Extension(app_state.clone()))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    app_state.mark_ready(Utc::now());

    info!(?config.environment, %addr, "operations monitor ready");

    axum::serve(listener, app).await?;
    Ok(())
}

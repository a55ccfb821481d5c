use crate::cli::ServeArgs;
use crate::infra::{AppState, TracingBoostPublisher};
use crate::routes::with_boost_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use scix_boost::boost::BoostEngine;
use scix_boost::config::AppConfig;
use scix_boost::error::AppError;
use scix_boost::pipeline::{BoostPipelineService, InMemoryBoostRepository};
use scix_boost::telemetry;
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

    let ranking = config.ranking.load()?;
    let engine = Arc::new(BoostEngine::new(&ranking)?);
    info!(
        disciplines = engine.disciplines().len(),
        source = ?config.ranking.path,
        "loaded ranking configuration"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryBoostRepository::default());
    let publisher = Arc::new(TracingBoostPublisher);
    let boost_service = Arc::new(BoostPipelineService::new(engine, repository, publisher));

    let app = with_boost_routes(boost_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "boost pipeline ready");

    axum::serve(listener, app).await?;
    Ok(())
}

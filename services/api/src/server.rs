use crate::cli::ServeArgs;
use crate::infra::{load_store, AppState};
use crate::routes::with_scheduling_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use interpreter_scheduling::config::AppConfig;
use interpreter_scheduling::error::AppError;
use interpreter_scheduling::scheduling::{InMemoryStatusAudit, SchedulingService};
use interpreter_scheduling::telemetry;
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

    let store = Arc::new(load_store(args.seed.as_deref())?);
    let audit = Arc::new(InMemoryStatusAudit::default());
    let scheduling_service = Arc::new(SchedulingService::new(
        store,
        audit,
        config.scheduling.clone(),
    ));

    let app = with_scheduling_routes(scheduling_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        recontact_window_minutes = config.scheduling.recontact_window_minutes,
        "interpreter scheduling service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

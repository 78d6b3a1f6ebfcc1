use crate::cli::ServeArgs;
use crate::infra::{apply_model_override, build_evaluator, AppState, ModelSource};
use crate::routes::with_page_routes;
use credit_risk::config::AppConfig;
use credit_risk::error::AppError;
use credit_risk::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    apply_model_override(&mut config.model, args.model.take());

    telemetry::init(&config.telemetry)?;

    // Model load failure is fatal.
    let evaluator = Arc::new(build_evaluator(&config.model, ModelSource::Shared)?);
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        evaluator,
    };

    let app = with_page_routes(app_state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        model = %config.model.path.display(),
        unseen_category = ?config.model.unseen_category,
        "credit risk assessor ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

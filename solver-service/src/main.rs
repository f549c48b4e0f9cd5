use service_core::observability::init_tracing;
use solver_service::config::SolverConfig;
use solver_service::services::init_metrics;
use solver_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = SolverConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "solver-service",
        config.common.log_level(),
        config.otlp_endpoint.as_deref(),
    );

    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics();

    tracing::info!(debug = config.common.debug, "Starting solver-service");

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}

//! Application startup and lifecycle management.

use crate::config::{HttpConfig, SolverConfig};
use crate::handlers;
use crate::services::providers::openai::{OpenAiConfig, OpenAiVisionModel};
use crate::services::providers::VisionModel;
use crate::services::HomeworkSolver;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    panic::catch_panic_layer,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: SolverConfig,
    pub solver: Arc<HomeworkSolver>,
}

impl AppState {
    pub fn new(config: SolverConfig, model: Arc<dyn VisionModel>) -> Self {
        let solver = Arc::new(HomeworkSolver::new(model, config.provider.model.clone()));
        Self { config, solver }
    }
}

/// Build the HTTP router for the given state.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.http);

    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/solve", post(handlers::solve_problem))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(state.config.http.max_upload_bytes))
        .layer(catch_panic_layer())
        .layer(cors)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost so the span above sees the id it assigns
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if http.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = http
        .cors_allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application backed by the hosted OpenAI-compatible model.
    pub async fn build(config: SolverConfig) -> Result<Self, AppError> {
        let model = OpenAiVisionModel::new(OpenAiConfig {
            api_key: config.provider.api_key.clone(),
            base_url: config.provider.base_url.clone(),
            temperature: config.provider.temperature,
        })
        .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

        if config.provider.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; solve requests will fail until it is");
        }

        tracing::info!(
            model = %config.provider.model,
            base_url = %config.provider.base_url,
            "Initialized vision model provider"
        );

        Self::build_with_model(config, Arc::new(model)).await
    }

    /// Build the application around an explicit model, e.g. a mock in tests.
    pub async fn build_with_model(
        config: SolverConfig,
        model: Arc<dyn VisionModel>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let state = AppState::new(config, model);
        let router = build_router(state);

        // Port 0 = random port for testing
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM, then drain in-flight requests.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

//! Application startup and lifecycle management.

use crate::config::RelayConfig;
use crate::handlers;
use crate::services::metrics;
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::services::{ModelProvider, UploadStager};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub provider: Arc<dyn ModelProvider>,
    pub stager: UploadStager,
}

/// Build the HTTP router for the given state.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.uploads.max_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/generate-text", post(handlers::generate_text))
        .route("/generate-from-image", post(handlers::generate_from_image))
        .route("/generate-from-document", post(handlers::generate_from_document))
        .route("/generate-from-audio", post(handlers::generate_from_audio))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application backed by the Gemini provider.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let gemini_config = GeminiConfig {
            api_key: config.google.api_key.clone(),
            model: config.model.name.clone(),
            api_base: config.model.api_base.clone(),
            timeout: Duration::from_secs(config.model.timeout_secs),
        };
        let provider = GeminiProvider::new(gemini_config)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        tracing::info!(model = %config.model.name, "Initialized Gemini provider");

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application with an explicit model provider.
    pub async fn build_with_provider(
        config: RelayConfig,
        provider: Arc<dyn ModelProvider>,
    ) -> Result<Self, AppError> {
        metrics::init_metrics();

        let stager = UploadStager::new(&config.uploads.dir).await.map_err(|e| {
            tracing::error!(
                "Failed to initialize upload directory {}: {}",
                config.uploads.dir,
                e
            );
            e
        })?;

        let state = AppState {
            config: config.clone(),
            provider,
            stager,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Gemini relay listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Run until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}

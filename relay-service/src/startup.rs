//! Application startup and lifecycle management.

use crate::config::RelayConfig;
use crate::handlers;
use crate::services::providers::dify::DifyProvider;
use crate::services::providers::WorkflowProvider;
use crate::services::ActivityRelay;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub relay: ActivityRelay,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the Dify provider from `config`.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let provider = DifyProvider::new(&config.dify)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        if config.dify.is_configured() {
            tracing::info!(user = %config.dify.user, "Initialized Dify provider");
        } else {
            tracing::warn!(
                "DIFY_API_BASE_URL or DIFY_API_KEY is not set; image requests will fail until configured"
            );
        }

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    pub async fn build_with_provider(
        config: RelayConfig,
        provider: Arc<dyn WorkflowProvider>,
    ) -> Result<Self, AppError> {
        let state = AppState {
            config: config.clone(),
            relay: ActivityRelay::new(provider),
        };

        let router = build_router(state)?;

        let address = format!("{}:{}", config.common.host, config.common.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Relay listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let origin = HeaderValue::from_str(&state.config.cors.allowed_origin).map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Invalid CORS origin '{}': {}",
            state.config.cors.allowed_origin,
            e
        ))
    })?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = state.config.body_limit();

    Ok(Router::new()
        .route("/health", get(handlers::health_check))
        .route("/generate-ideas", post(handlers::generate_ideas))
        .route("/api/generate-ideas", post(handlers::generate_ideas))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
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

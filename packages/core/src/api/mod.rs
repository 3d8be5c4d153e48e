//! HTTP surface: Alertmanager's webhook, the probe endpoint and metrics.
//!
//! All dependencies reach the handlers through [`AppState`]; nothing is
//! global.

pub mod alert;
pub mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::alerts::dispatch::Dispatcher;
use crate::config::Config;
use crate::error::AppError;
use crate::health::Healthcheck;
use crate::metrics::AppMetrics;
use crate::services::gotify::{GotifyClient, NotificationBackend};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub healthcheck: Arc<Healthcheck>,
    pub metrics: Arc<AppMetrics>,
    /// False when no Gotify app key is set; alerts are then refused.
    pub configured: bool,
}

impl AppState {
    pub fn new(backend: Arc<dyn NotificationBackend>, config: &Config) -> Result<Self, AppError> {
        let metrics = Arc::new(
            AppMetrics::new().map_err(|err| AppError::Server(format!("metrics: {}", err)))?,
        );

        Ok(Self {
            dispatcher: Arc::new(Dispatcher::new(
                backend.clone(),
                config.policy(),
                metrics.clone(),
            )),
            healthcheck: Arc::new(Healthcheck::new(backend)),
            metrics,
            configured: config.has_app_key(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let gotify = GotifyClient::from_config(config)?;
        tracing::debug!("Gotify endpoint: {}", gotify.base_url());
        Self::new(Arc::new(gotify), config)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/alert", post(alert::receive_alerts))
        .route("/healthcheck", get(health::healthcheck))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Plain-text status/reason response.
///
/// Anything that is not a usable HTTP status becomes a 500.
pub fn plain_response(status: u16, reason: impl Into<String>) -> Response {
    let status = StatusCode::from_u16(status)
        .ok()
        .filter(|status| !status.is_informational())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, reason.into()).into_response()
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            plain_response(500, "metrics error")
        }
    }
}

/// Bind `0.0.0.0:<listen_port>` and serve until Ctrl+C.
pub async fn serve(state: AppState, listen_port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Server(format!("Failed to bind {}: {}", addr, err)))?;

    tracing::info!("Starting web server on port {}", listen_port);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Server(err.to_string()))?;

    tracing::info!("Exiting");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received."),
        Err(err) => {
            tracing::error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}

//! Web layer — axum server for the balance report pages.
//!
//! Serves server-rendered HTML only: the two report routes and a
//! liveness probe. State is shared via `Arc<AppState>`.

pub mod render;
pub mod routes;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::directory::AccountDirectory;
use crate::exchange::BalanceProvider;
use crate::types::AccountCredential;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct AppState {
    pub provider: Arc<dyn BalanceProvider>,
    pub directory: Arc<dyn AccountDirectory>,
    /// Single-tenant credential slots, resolved from the environment
    /// at startup.
    pub accounts: Vec<AccountCredential>,
    /// Single-tenant initial stake in USD.
    pub initial_stake: f64,
}

pub type SharedState = Arc<AppState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Whole-request failure wrapper.
///
/// Per-account fetch errors never reach this; they are rendered
/// inline. This covers failures outside that scope, like the account
/// directory being unreachable, and maps them to a plain 500.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Request failed");
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

// ---------------------------------------------------------------------------
// Router & server
// ---------------------------------------------------------------------------

/// Build the Axum router with all routes and middleware.
///
/// Route order matters only for readers: axum prefers the exact
/// `/health` match over the `/:username` capture.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(routes::single_tenant_report))
        .route("/health", get(routes::health))
        .route("/:username", get(routes::user_report))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: SharedState, host: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

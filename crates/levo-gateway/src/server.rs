// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use levo_agent::ConversationService;
use levo_core::LevoError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::sse;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The conversation service every route delegates to.
    pub service: Arc<ConversationService>,
    /// Agent display name, echoed by `GET /`.
    pub agent_name: String,
}

/// Bind address for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the gateway router:
/// - GET /
/// - GET /health
/// - POST /chat
/// - POST /chat/stream
/// - GET /history/{user_id}
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handlers::get_root))
        .route("/health", get(handlers::get_health))
        .route("/chat", post(handlers::post_chat))
        .route("/chat/stream", post(sse::post_chat_stream))
        .route("/history/{user_id}", get(handlers::get_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the gateway until `shutdown` is cancelled, then drains in-flight
/// requests and returns.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), LevoError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LevoError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| LevoError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("8000"));
    }
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use levo_core::{HealthStatus, LevoError};
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

/// User id applied when a chat request omits one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Request body for POST /chat and POST /chat/stream.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message. Missing is treated as empty and rejected.
    #[serde(default)]
    pub prompt: String,
    /// Caller-asserted user id; defaults to [`ANONYMOUS_USER`].
    #[serde(default)]
    pub user_id: Option<String>,
}

impl ChatRequest {
    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(ANONYMOUS_USER)
    }
}

/// Response body for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// False when the turn could not be written to history.
    pub persisted: bool,
}

/// Response body for GET /history/{user_id}.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub entries: Vec<String>,
}

/// One collaborator in GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` when every component is healthy, otherwise `degraded`.
    pub status: String,
    pub components: Vec<ComponentHealth>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A [`LevoError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub LevoError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LevoError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LevoError::Completion(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LevoError> for ApiError {
    fn from(err: LevoError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(LevoError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// GET /
pub async fn get_root(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": format!("{} API is running!", state.agent_name)
    }))
}

/// GET /health
///
/// 200 when every collaborator is healthy, 503 otherwise.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let components: Vec<ComponentHealth> = state
        .service
        .health()
        .await
        .into_iter()
        .map(|(name, status)| {
            let (status, detail) = match status {
                HealthStatus::Healthy => ("healthy", None),
                HealthStatus::Unhealthy(d) => ("unhealthy", Some(d)),
            };
            ComponentHealth {
                name,
                status: status.to_string(),
                detail,
            }
        })
        .collect();

    let all_healthy = components.iter().all(|c| c.status == "healthy");
    let code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if all_healthy { "ok" } else { "degraded" }.to_string(),
        components,
    };
    (code, Json(body)).into_response()
}

/// POST /chat
pub async fn post_chat(
    State(state): State<GatewayState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(body) = body?;
    let turn = state
        .service
        .handle_turn(body.user_id(), &body.prompt)
        .await?;
    Ok(Json(ChatResponse {
        response: turn.reply,
        persisted: turn.persisted,
    }))
}

/// GET /history/{user_id}
pub async fn get_history(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let entries = state.service.get_history(&user_id).await?;
    Ok(Json(HistoryResponse { user_id, entries }))
}

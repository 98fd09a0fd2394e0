// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Levo.
//!
//! A thin axum layer over [`levo_agent::ConversationService`]: JSON chat,
//! SSE streaming chat, history lookup and health. Every error is returned as
//! a `{"error": "..."}` body with a status derived from the error kind.

pub mod handlers;
pub mod server;
pub mod sse;

pub use handlers::{ANONYMOUS_USER, ApiError, ChatRequest, ChatResponse, HistoryResponse};
pub use server::{GatewayState, ServerConfig, router, start_server};

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events streaming for POST /chat/stream.
//!
//! SSE event format:
//! ```text
//! data: {"text": "partial content here"}
//!
//! event: done
//! data: {"persisted": true}
//!
//! data: [DONE]
//! ```
//!
//! A provider failure mid-stream ends the stream with
//! `event: error` / `data: {"error": "..."}` instead of `[DONE]`. When the
//! client disconnects, axum drops the stream and the turn is abandoned
//! without being persisted.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use levo_agent::TurnEvent;

use crate::handlers::{ApiError, ChatRequest};
use crate::server::GatewayState;

/// Terminal data line of a successful stream.
pub const DONE_DATA: &str = "[DONE]";

/// POST /chat/stream
///
/// Input and startup errors are returned as plain JSON error responses;
/// once the stream is open, failures are reported as an `error` event.
pub async fn post_chat_stream(
    State(state): State<GatewayState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Json(body) = body?;
    let turn = state
        .service
        .handle_turn_streaming(body.user_id(), &body.prompt)
        .await?;

    let events = turn
        .flat_map(|event| stream::iter(to_events(event)))
        .map(Ok::<_, Infallible>);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_events(event: TurnEvent) -> Vec<Event> {
    match event {
        TurnEvent::Delta(text) => {
            vec![Event::default().data(serde_json::json!({ "text": text }).to_string())]
        }
        TurnEvent::Done { persisted } => vec![
            Event::default()
                .event("done")
                .data(serde_json::json!({ "persisted": persisted }).to_string()),
            Event::default().data(DONE_DATA),
        ],
        TurnEvent::Error(message) => vec![
            Event::default()
                .event("error")
                .data(serde_json::json!({ "error": message }).to_string()),
        ],
    }
}

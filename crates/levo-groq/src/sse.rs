// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE parsing for streamed chat completions.
//!
//! Each `data:` line carries one JSON chunk; the literal `data: [DONE]` ends
//! the stream. An `{"error": ...}` payload mid-stream becomes an error item.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{self, Stream, StreamExt};
use levo_core::UpstreamError;
use serde::Deserialize;

use crate::client::SERVICE;
use crate::types::{ApiErrorResponse, ChatCompletionChunk};

/// Terminator sent as the data of the last event.
pub const DONE_SENTINEL: &str = "[DONE]";

pub type ChunkEventStream =
    Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, UpstreamError>> + Send>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Error(ApiErrorResponse),
    Chunk(ChatCompletionChunk),
}

/// Parses a streaming response body into chat-completion chunks.
///
/// Events before `[DONE]` are yielded in order; anything after it is ignored.
/// Comment and keep-alive events with empty data are skipped. A body that
/// ends without `[DONE]` was cut off, so the stream ends with an error item.
pub fn parse_sse_stream(response: reqwest::Response) -> ChunkEventStream {
    let events = Box::pin(response.bytes_stream().eventsource());

    let chunks = stream::unfold(Some(events), |state| async move {
        let Some(mut events) = state else {
            return None;
        };
        loop {
            let item = match events.next().await {
                Some(Ok(ev)) if ev.data.trim() == DONE_SENTINEL => return None,
                Some(Ok(ev)) if ev.data.trim().is_empty() => continue,
                Some(Ok(ev)) => parse_payload(&ev.data),
                Some(Err(e)) => Err(UpstreamError::new(
                    SERVICE,
                    format!("SSE stream error: {e}"),
                )),
                None => {
                    return Some((
                        Err(UpstreamError::new(
                            SERVICE,
                            "stream ended before the [DONE] terminator",
                        )),
                        None,
                    ));
                }
            };
            return Some((item, Some(events)));
        }
    });

    Box::pin(chunks)
}

fn parse_payload(data: &str) -> Result<ChatCompletionChunk, UpstreamError> {
    match serde_json::from_str::<Payload>(data) {
        Ok(Payload::Chunk(chunk)) => Ok(chunk),
        Ok(Payload::Error(err)) => Err(UpstreamError::new(
            SERVICE,
            format!("stream error: {}", err.error),
        )),
        Err(e) => Err(
            UpstreamError::new(SERVICE, format!("failed to parse stream chunk: {e}"))
                .with_source(e),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serves `sse_text` from a mock server to get a real `reqwest::Response`.
    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;

        reqwest::get(&server.uri()).await.unwrap()
    }

    fn delta_event(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({
                "id": "c", "model": "m",
                "choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]
            })
        )
    }

    #[tokio::test]
    async fn yields_deltas_in_order_and_stops_at_done() {
        let sse = format!(
            "{}{}data: [DONE]\n\n{}",
            delta_event("Hel"),
            delta_event("lo"),
            delta_event("ignored")
        );
        let chunks: Vec<_> = parse_sse_stream(mock_sse_response(&sse).await)
            .collect()
            .await;

        let texts: Vec<_> = chunks
            .into_iter()
            .map(|c| c.unwrap().choices[0].delta.content.clone().unwrap())
            .collect();
        assert_eq!(texts, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn error_payload_becomes_error_item() {
        let sse = "data: {\"error\":{\"message\":\"model overloaded\",\"type\":\"server_error\"}}\n\n";
        let mut stream = parse_sse_stream(mock_sse_response(sse).await);

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.message.contains("model overloaded"), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let mut stream = parse_sse_stream(mock_sse_response("data: {nope\n\n").await);
        assert!(stream.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn body_ending_without_done_is_an_error() {
        let sse = delta_event("The answer is");
        let chunks: Vec<_> = parse_sse_stream(mock_sse_response(&sse).await)
            .collect()
            .await;

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_ok());
        let err = chunks[1].as_ref().unwrap_err();
        assert!(err.message.contains("[DONE]"), "got: {err}");
    }

    #[tokio::test]
    async fn done_after_keep_alive_ends_cleanly() {
        let sse = format!("{}: keep-alive\n\ndata: [DONE]\n\n", delta_event("ok"));
        let chunks: Vec<_> = parse_sse_stream(mock_sse_response(&sse).await)
            .collect()
            .await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_ok());
    }
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI-compatible chat-completions API.
//!
//! Provides [`GroqClient`] which handles request construction,
//! bearer authentication, streaming SSE responses, and transient error retry.

use std::time::Duration;

use levo_core::{LevoError, UpstreamError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::sse::{self, ChunkEventStream};
use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// Name reported in every [`UpstreamError`] from this crate.
pub(crate) const SERVICE: &str = "groq";

/// HTTP client for chat-completions communication.
///
/// Retries once, after a one-second pause, on 429, 500, 502, and 503.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl GroqClient {
    /// Creates a client for `{base_url}/chat/completions`.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, LevoError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| LevoError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LevoError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Shortens the pause between attempts (tests).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends a non-streaming request and returns the full response.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, UpstreamError> {
        let mut req = request.clone();
        req.stream = false;

        let response = self.send(&req).await?;
        let body = response.text().await.map_err(|e| {
            UpstreamError::new(SERVICE, format!("failed to read response body: {e}")).with_source(e)
        })?;
        serde_json::from_str(&body).map_err(|e| {
            UpstreamError::new(SERVICE, format!("failed to parse API response: {e}")).with_source(e)
        })
    }

    /// Sends a streaming request and returns the parsed chunk stream.
    pub async fn stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChunkEventStream, UpstreamError> {
        let mut req = request.clone();
        req.stream = true;

        let response = self.send(&req).await?;
        Ok(sse::parse_sse_stream(response))
    }

    /// POSTs `req`, retrying transient statuses, and returns the first 2xx response.
    async fn send(&self, req: &ChatCompletionRequest) -> Result<reqwest::Response, UpstreamError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                warn!(attempt, "retrying chat completion after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(req)
                .send()
                .await
                .map_err(|e| {
                    UpstreamError::new(SERVICE, format!("HTTP request failed: {e}")).with_source(e)
                })?;

            let status = response.status();
            debug!(status = %status, attempt, stream = req.stream, "chat completion response received");

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                attempt += 1;
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("API error ({status}): {}", api_err.error),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(UpstreamError::new(SERVICE, message).with_status(status.as_u16()));
        }
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use levo_core::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GroqClient {
        GroqClient::new("gsk-test", base_url, Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    fn test_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "llama-3.1-8b-instant".into(),
            messages: vec![ChatMessage::user("Hello")],
            max_tokens: 128,
            temperature: None,
            stream: false,
        }
    }

    fn success_body(id: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "object": "chat.completion",
            "model": "llama-3.1-8b-instant",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 4, "total_tokens": 13}
        })
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = test_client("https://api.groq.com/openai/v1/");
        assert_eq!(client.endpoint(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[tokio::test]
    async fn complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer gsk-test"))
            .and(body_partial_json(serde_json::json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("c1", "Hi!")))
            .mount(&server)
            .await;

        let resp = test_client(&server.uri()).complete(&test_request()).await.unwrap();
        assert_eq!(resp.id, "c1");
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("Hi!"));
        assert_eq!(resp.usage.unwrap().prompt_tokens, 9);
    }

    #[tokio::test]
    async fn complete_retries_once_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit reached", "type": "tokens"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("c2", "after retry")))
            .mount(&server)
            .await;

        let resp = test_client(&server.uri()).complete(&test_request()).await.unwrap();
        assert_eq!(resp.id, "c2");
    }

    #[tokio::test]
    async fn complete_fails_fast_on_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Invalid API Key", "type": "invalid_request_error", "code": "invalid_api_key"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(&test_request())
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(401));
        assert_eq!(err.service, "groq");
        assert!(err.message.contains("Invalid API Key"), "got: {err}");
    }

    #[tokio::test]
    async fn complete_gives_up_after_second_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(&test_request())
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(503));
        assert!(err.message.contains("upstream overloaded"));
    }

    #[tokio::test]
    async fn malformed_body_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(&test_request())
            .await
            .unwrap_err();
        assert!(err.message.contains("failed to parse"));
        assert!(err.status.is_none());
    }
}

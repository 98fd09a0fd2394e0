// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockCompletion` implements `CompletionProvider` with pre-configured
//! replies and scripted streams, and records every request it receives so
//! tests can assert on the assembled prompt.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use levo_core::{
    AdapterType, ChunkStream, CompletionChunk, CompletionProvider, CompletionRequest,
    CompletionResponse, HealthStatus, LevoError, PluginAdapter, TokenUsage, UpstreamError,
};

const SERVICE: &str = "mock-completion";

/// How a scripted stream ends after its chunks.
#[derive(Debug, Clone)]
enum StreamEnding {
    /// Ends normally.
    Finish,
    /// Yields an upstream error.
    Fail(String),
    /// Never ends; only consumer cancellation stops it.
    Hang,
}

#[derive(Debug, Clone)]
struct ScriptedStream {
    chunks: Vec<String>,
    ending: StreamEnding,
}

/// A mock completion provider.
///
/// `complete` pops replies from a FIFO queue and falls back to
/// `"mock response"`. `stream` plays the next scripted stream, or streams
/// the next reply as a single fragment when none is scripted.
pub struct MockCompletion {
    responses: Arc<Mutex<VecDeque<String>>>,
    streams: Arc<Mutex<VecDeque<ScriptedStream>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    failure: Option<String>,
}

impl MockCompletion {
    /// Create a mock with an empty reply queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            streams: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// Create a mock pre-loaded with replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Self::new()
        }
    }

    /// Create a mock whose every call fails with `message` (HTTP 503).
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Queue another reply.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// Script the next stream to yield `chunks` and then end.
    pub async fn push_stream(&self, chunks: Vec<String>) {
        self.push(chunks, StreamEnding::Finish).await;
    }

    /// Script the next stream to yield `chunks` and then fail with `message`.
    pub async fn push_stream_failure(&self, chunks: Vec<String>, message: impl Into<String>) {
        self.push(chunks, StreamEnding::Fail(message.into())).await;
    }

    /// Script the next stream to yield `chunks` and then stall forever.
    pub async fn push_stream_hang(&self, chunks: Vec<String>) {
        self.push(chunks, StreamEnding::Hang).await;
    }

    /// Every request received so far, in call order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn push(&self, chunks: Vec<String>, ending: StreamEnding) {
        self.streams
            .lock()
            .await
            .push_back(ScriptedStream { chunks, ending });
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }

    async fn record(&self, request: &CompletionRequest) -> Result<(), UpstreamError> {
        self.requests.lock().await.push(request.clone());
        match &self.failure {
            Some(message) => Err(UpstreamError::new(SERVICE, message.clone()).with_status(503)),
            None => Ok(()),
        }
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

fn usage() -> TokenUsage {
    TokenUsage {
        prompt_tokens: 10,
        completion_tokens: 20,
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        SERVICE
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, LevoError> {
        Ok(match &self.failure {
            Some(message) => HealthStatus::Unhealthy(message.clone()),
            None => HealthStatus::Healthy,
        })
    }

    async fn shutdown(&self) -> Result<(), LevoError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, UpstreamError> {
        self.record(&request).await?;
        Ok(CompletionResponse {
            id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
            content: self.next_response().await,
            model: request.model,
            finish_reason: Some("stop".to_string()),
            usage: Some(usage()),
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, UpstreamError> {
        self.record(&request).await?;

        let scripted = match self.streams.lock().await.pop_front() {
            Some(scripted) => scripted,
            None => ScriptedStream {
                chunks: vec![self.next_response().await],
                ending: StreamEnding::Finish,
            },
        };

        let deltas = stream::iter(scripted.chunks.into_iter().map(|delta| {
            Ok(CompletionChunk {
                delta,
                ..CompletionChunk::default()
            })
        }));

        let stream: ChunkStream = match scripted.ending {
            StreamEnding::Finish => Box::pin(deltas.chain(stream::once(async {
                Ok(CompletionChunk {
                    delta: String::new(),
                    finish_reason: Some("stop".to_string()),
                    usage: Some(usage()),
                })
            }))),
            StreamEnding::Fail(message) => Box::pin(deltas.chain(stream::once(async move {
                Err(UpstreamError::new(SERVICE, message))
            }))),
            StreamEnding::Hang => Box::pin(deltas.chain(stream::pending())),
        };
        Ok(stream)
    }
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Groq completion provider for Levo.
//!
//! Implements [`CompletionProvider`] over the OpenAI-compatible
//! `/chat/completions` endpoint, for both single-shot and streamed replies.

pub mod client;
pub mod sse;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use levo_config::model::CompletionConfig;
use levo_core::{
    AdapterType, ChunkStream, CompletionChunk, CompletionProvider, CompletionRequest,
    CompletionResponse, HealthStatus, LevoError, PluginAdapter, TokenUsage, UpstreamError,
};
use tracing::{debug, info};

use crate::client::{GroqClient, SERVICE};
use crate::types::{ChatCompletionChunk, ChatCompletionRequest, Usage};

/// Environment variable consulted when `completion.api_key` is unset.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Groq chat-completions provider implementing [`CompletionProvider`].
///
/// API key resolution order: config -> `GROQ_API_KEY` env var -> error.
pub struct GroqProvider {
    client: GroqClient,
    default_model: String,
}

impl GroqProvider {
    pub fn new(config: &CompletionConfig) -> Result<Self, LevoError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = GroqClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(model = %config.model, endpoint = client.endpoint(), "Groq provider initialized");

        Ok(Self {
            client,
            default_model: config.model.clone(),
        })
    }

    /// Wraps an existing client.
    pub fn with_client(client: GroqClient, default_model: impl Into<String>) -> Self {
        Self {
            client,
            default_model: default_model.into(),
        }
    }

    fn to_api_request(&self, request: CompletionRequest) -> ChatCompletionRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model
        };
        ChatCompletionRequest {
            model,
            messages: request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: request.stream,
        }
    }
}

#[async_trait]
impl PluginAdapter for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, LevoError> {
        // No request is made: a health call would spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LevoError> {
        debug!("Groq provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, UpstreamError> {
        let api_request = self.to_api_request(request);
        let response = self.client.complete(&api_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::new(SERVICE, "response contained no choices"))?;

        Ok(CompletionResponse {
            id: response.id,
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
            finish_reason: choice.finish_reason,
            usage: response.usage.map(to_token_usage),
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, UpstreamError> {
        let api_request = self.to_api_request(request);
        let events = self.client.stream(&api_request).await?;
        Ok(Box::pin(events.map(|item| item.map(to_completion_chunk))))
    }
}

fn to_token_usage(usage: Usage) -> TokenUsage {
    TokenUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
    }
}

/// Flattens one wire chunk into the provider-neutral form. Only the first
/// choice is used; Levo never requests `n > 1`.
fn to_completion_chunk(chunk: ChatCompletionChunk) -> CompletionChunk {
    let usage = chunk.usage().map(to_token_usage);
    let (delta, finish_reason) = chunk
        .choices
        .into_iter()
        .next()
        .map(|c| (c.delta.content.unwrap_or_default(), c.finish_reason))
        .unwrap_or_default();
    CompletionChunk {
        delta,
        finish_reason,
        usage,
    }
}

/// Resolves the API key from config or the `GROQ_API_KEY` environment variable.
pub fn resolve_api_key(config_key: Option<&str>) -> Result<String, LevoError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }

    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(LevoError::Config(format!(
            "Groq API key not found. Set completion.api_key in config or the {API_KEY_ENV} environment variable."
        ))),
    }
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider trait for hosted LLM chat APIs.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::UpstreamError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionChunk, CompletionRequest, CompletionResponse};

/// Ordered stream of completion chunks. Ends when the provider sends its end marker.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<CompletionChunk, UpstreamError>> + Send>>;

/// Adapter for chat-completion providers.
///
/// Supports a single synchronous reply and an incremental stream. Both are
/// fail-fast: errors are reported as [`UpstreamError`] and never retried
/// beyond the implementation's own transient-error policy.
#[async_trait]
pub trait CompletionProvider: PluginAdapter {
    /// Sends the message list and returns the whole reply.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, UpstreamError>;

    /// Sends the message list and returns reply fragments in production order.
    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, UpstreamError>;
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the conversation pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    /// Returns true only for [`HealthStatus::Healthy`].
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdapterType {
    Completion,
    Retrieval,
    Storage,
}

/// Speaker of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single `{role, content}` pair sent to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One persisted row of a user's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Monotonic insertion ordinal; replay order.
    pub sequence: i64,
    /// Caller-asserted user identifier.
    pub user_id: String,
    /// Prompt or reply text.
    pub text: String,
    /// RFC 3339 UTC timestamp of the append.
    pub created_at: String,
}

/// Label of an assembled context block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Stable identity and rules.
    Persona,
    /// Volatile facts for this turn (date, extra context).
    Situational,
    /// Prior conversation for this user.
    History,
    /// Freshly retrieved external data.
    Retrieved,
}

/// A labeled block of text assembled for a single turn. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSegment {
    pub kind: SegmentKind,
    pub text: String,
}

impl ContextSegment {
    pub fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A request to the completion provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub stream: bool,
}

/// Token usage reported by the completion provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// A full, non-streaming reply from the completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// One incremental piece of a streaming completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionChunk {
    /// Text appended to the reply by this chunk (may be empty).
    pub delta: String,
    /// Set on the final chunk of a choice.
    pub finish_reason: Option<String>,
    /// Usage, when the provider reports it on the last chunk.
    pub usage: Option<TokenUsage>,
}

/// One search result returned by the retrieval provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

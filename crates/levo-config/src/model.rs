// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Levo.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Levo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LevoConfig {
    /// Agent identity and persona settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Chat-completion provider settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Web search (retrieval) settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Ordered keyword triggers that enable retrieval for a prompt.
    #[serde(default = "default_triggers")]
    pub triggers: Vec<TriggerConfig>,

    /// History store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Context assembly settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for LevoConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            completion: CompletionConfig::default(),
            search: SearchConfig::default(),
            triggers: default_triggers(),
            storage: StorageConfig::default(),
            context: ContextConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Agent identity and persona configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline persona (system instructions). Overridden by `persona_file` if both set.
    #[serde(default)]
    pub persona: Option<String>,

    /// Path to a markdown file containing the persona.
    #[serde(default)]
    pub persona_file: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            persona: None,
            persona_file: None,
        }
    }
}

fn default_agent_name() -> String {
    "lEvO".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chat-completion provider configuration (OpenAI-compatible endpoint).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    /// API key. `None` falls back to the `GROQ_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the chat-completions API (without `/chat/completions`).
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature. `None` uses the provider default.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds.
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_completion_base_url(),
            model: default_completion_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

fn default_completion_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_completion_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_completion_timeout_secs() -> u64 {
    60
}

/// Web search configuration (Custom Search JSON API).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Enable keyword-triggered retrieval.
    #[serde(default = "default_search_enabled")]
    pub enabled: bool,

    /// API key. `None` falls back to the `LEVO_SEARCH_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Search engine id (`cx` parameter).
    #[serde(default)]
    pub engine_id: Option<String>,

    /// Search endpoint URL.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Number of results to request (top-N).
    #[serde(default = "default_max_results")]
    pub max_results: u8,

    /// Request timeout in seconds.
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: default_search_enabled(),
            api_key: None,
            engine_id: None,
            base_url: default_search_base_url(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

fn default_search_enabled() -> bool {
    true
}

fn default_search_base_url() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_max_results() -> u8 {
    3
}

fn default_search_timeout_secs() -> u64 {
    10
}

/// One retrieval trigger: if any keyword appears in the prompt, search
/// (optionally restricted to `site_filter`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerConfig {
    /// Unique name used in logs.
    pub name: String,

    /// Case-insensitive whole-word keywords.
    pub keywords: Vec<String>,

    /// Site to restrict the search to, e.g. `amazon.com`.
    #[serde(default)]
    pub site_filter: Option<String>,
}

fn default_triggers() -> Vec<TriggerConfig> {
    vec![
        TriggerConfig {
            name: "commerce".to_string(),
            keywords: vec!["amazon".to_string()],
            site_filter: Some("amazon.com".to_string()),
        },
        TriggerConfig {
            name: "video".to_string(),
            keywords: vec!["youtube".to_string()],
            site_filter: Some("youtube.com".to_string()),
        },
    ]
}

/// History store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("levo").join("levo.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("levo.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Context assembly configuration.
///
/// Bounds how much history is replayed into each prompt; the store itself
/// keeps everything.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Keep at most this many recent history entries.
    #[serde(default = "default_history_max_entries")]
    pub history_max_entries: usize,

    /// Keep at most this many characters of joined history.
    #[serde(default = "default_history_char_budget")]
    pub history_char_budget: usize,

    /// Add a "Today's date is ..." situational segment.
    #[serde(default = "default_include_date")]
    pub include_date: bool,

    /// Extra situational lines, added after the date in the given order.
    #[serde(default)]
    pub extra_context: Vec<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_max_entries: default_history_max_entries(),
            history_char_budget: default_history_char_budget(),
            include_date: default_include_date(),
            extra_context: Vec::new(),
        }
    }
}

fn default_history_max_entries() -> usize {
    50
}

fn default_history_char_budget() -> usize {
    16_000
}

fn default_include_date() -> bool {
    true
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Capacity of the per-request streaming channel.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_stream_buffer() -> usize {
    32
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web search retrieval provider.
//!
//! Queries a Custom Search style JSON endpoint and returns the top hits as
//! `(title, url)` pairs. Failures are reported, never retried; the caller
//! decides whether to continue without results.

use std::time::Duration;

use async_trait::async_trait;
use levo_config::model::SearchConfig;
use levo_core::{
    AdapterType, HealthStatus, LevoError, PluginAdapter, RetrievalProvider, SearchHit,
    UpstreamError,
};
use serde::Deserialize;
use tracing::{debug, info};

/// Environment variable consulted when `search.api_key` is unset.
pub const API_KEY_ENV: &str = "LEVO_SEARCH_API_KEY";

const SERVICE: &str = "web-search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    link: String,
}

#[derive(Debug, Deserialize)]
struct SearchErrorResponse {
    error: SearchErrorDetail,
}

#[derive(Debug, Deserialize)]
struct SearchErrorDetail {
    #[serde(default)]
    code: Option<u16>,
    message: String,
}

/// Retrieval provider backed by a Custom Search JSON API.
pub struct WebSearchProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    engine_id: String,
    max_results: u8,
}

impl WebSearchProvider {
    /// Builds the provider. Fails if no API key or engine id is configured.
    pub fn new(config: &SearchConfig) -> Result<Self, LevoError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let engine_id = config
            .engine_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LevoError::Config("search.engine_id is required when search is enabled".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LevoError::Config(format!("failed to build HTTP client: {e}")))?;

        info!(endpoint = %config.base_url, max_results = config.max_results, "web search provider initialized");

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            engine_id,
            max_results: config.max_results,
        })
    }

    fn request_url(&self, query: &str, site_filter: Option<&str>) -> Result<reqwest::Url, UpstreamError> {
        let num = self.max_results.to_string();
        let mut params = vec![
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", query),
            ("num", num.as_str()),
        ];
        if let Some(site) = site_filter {
            params.push(("siteSearch", site));
        }
        reqwest::Url::parse_with_params(&self.base_url, &params).map_err(|e| {
            UpstreamError::new(SERVICE, format!("invalid search endpoint: {e}")).with_source(e)
        })
    }
}

#[async_trait]
impl PluginAdapter for WebSearchProvider {
    fn name(&self) -> &str {
        "web-search"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Retrieval
    }

    async fn health_check(&self) -> Result<HealthStatus, LevoError> {
        // Every query is billed, so health is not checked remotely.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LevoError> {
        Ok(())
    }
}

#[async_trait]
impl RetrievalProvider for WebSearchProvider {
    async fn search(
        &self,
        query: &str,
        site_filter: Option<&str>,
    ) -> Result<Vec<SearchHit>, UpstreamError> {
        let url = self.request_url(query, site_filter)?;
        let response = self.client.get(url).send().await.map_err(|e| {
            UpstreamError::new(SERVICE, format!("HTTP request failed: {e}")).with_source(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            UpstreamError::new(SERVICE, format!("failed to read response body: {e}")).with_source(e)
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<SearchErrorResponse>(&body) {
                Ok(err) => format!(
                    "API error ({}): {}",
                    err.error.code.unwrap_or(status.as_u16()),
                    err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(UpstreamError::new(SERVICE, message).with_status(status.as_u16()));
        }

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            UpstreamError::new(SERVICE, format!("failed to parse search response: {e}")).with_source(e)
        })?;

        let hits: Vec<SearchHit> = parsed
            .items
            .into_iter()
            .take(usize::from(self.max_results))
            .map(|item| SearchHit {
                title: item.title,
                url: item.link,
            })
            .collect();

        debug!(site_filter, hits = hits.len(), "web search complete");
        Ok(hits)
    }
}

/// Resolves the API key from config or the `LEVO_SEARCH_API_KEY` environment variable.
pub fn resolve_api_key(config_key: Option<&str>) -> Result<String, LevoError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(LevoError::Config(format!(
            "search API key not found. Set search.api_key in config or the {API_KEY_ENV} environment variable."
        ))),
    }
}

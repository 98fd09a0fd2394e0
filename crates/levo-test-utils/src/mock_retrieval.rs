// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock retrieval provider that returns fixed hits or a fixed failure.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use levo_core::{
    AdapterType, HealthStatus, LevoError, PluginAdapter, RetrievalProvider, SearchHit,
    UpstreamError,
};

const SERVICE: &str = "mock-retrieval";

/// A mock search provider. Every call is recorded as `(query, site_filter)`.
pub struct MockRetrieval {
    outcome: Result<Vec<SearchHit>, String>,
    calls: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl MockRetrieval {
    /// Always return `hits`.
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            outcome: Ok(hits),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockRetrieval {
    fn name(&self) -> &str {
        SERVICE
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Retrieval
    }

    async fn health_check(&self) -> Result<HealthStatus, LevoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LevoError> {
        Ok(())
    }
}

#[async_trait]
impl RetrievalProvider for MockRetrieval {
    async fn search(
        &self,
        query: &str,
        site_filter: Option<&str>,
    ) -> Result<Vec<SearchHit>, UpstreamError> {
        self.calls
            .lock()
            .await
            .push((query.to_string(), site_filter.map(str::to_string)));
        self.outcome
            .clone()
            .map_err(|message| UpstreamError::new(SERVICE, message))
    }
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval provider trait for web search lookups.

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::traits::adapter::PluginAdapter;
use crate::types::SearchHit;

/// Adapter for search endpoints used to enrich a turn with fresh links.
///
/// Callers must tolerate failure: a failed search never aborts a turn.
#[async_trait]
pub trait RetrievalProvider: PluginAdapter {
    /// Returns the top results for `query`, optionally restricted to one site.
    async fn search(
        &self,
        query: &str,
        site_filter: Option<&str>,
    ) -> Result<Vec<SearchHit>, UpstreamError>;
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a real [`ConversationService`] over a temp SQLite
//! history store and mock collaborators, with a fixed clock so assembled
//! prompts are deterministic.

use std::sync::Arc;

use chrono::NaiveDate;
use levo_agent::{ConversationService, TurnReply, TurnSettings};
use levo_config::model::{ContextConfig, LevoConfig, StorageConfig};
use levo_context::{ContextEngine, TriggerTable};
use levo_core::{HistoryStore, LevoError, SearchHit};
use levo_storage::SqliteHistoryStore;

use crate::mock_completion::MockCompletion;
use crate::mock_retrieval::MockRetrieval;

/// The date every harness turn sees.
pub fn harness_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap_or_default()
}

enum RetrievalSetup {
    None,
    Hits(Vec<SearchHit>),
    Failing(String),
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    completion_failure: Option<String>,
    retrieval: RetrievalSetup,
    persona: String,
    context: ContextConfig,
    settings: TurnSettings,
    service_store: Option<Arc<dyn HistoryStore>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            completion_failure: None,
            retrieval: RetrievalSetup::None,
            persona: "You are a test assistant.".to_string(),
            context: ContextConfig::default(),
            settings: TurnSettings::default(),
            service_store: None,
        }
    }

    /// Set mock completion replies.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Make every completion call fail.
    pub fn with_failing_completion(mut self, message: impl Into<String>) -> Self {
        self.completion_failure = Some(message.into());
        self
    }

    /// Enable retrieval (default triggers) returning `hits`.
    pub fn with_search_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.retrieval = RetrievalSetup::Hits(hits);
        self
    }

    /// Enable retrieval (default triggers) that always fails.
    pub fn with_failing_search(mut self, message: impl Into<String>) -> Self {
        self.retrieval = RetrievalSetup::Failing(message.into());
        self
    }

    /// Set a custom persona.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// Override context settings (history window, date, extra lines).
    pub fn with_context(mut self, context: ContextConfig) -> Self {
        self.context = context;
        self
    }

    /// Override completion settings.
    pub fn with_settings(mut self, settings: TurnSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Serve turns from `store` instead of the temp SQLite store.
    ///
    /// [`TestHarness::history`] still reads SQLite, which stays empty.
    pub fn with_service_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.service_store = Some(store);
        self
    }

    /// Build the harness and initialize its store.
    pub async fn build(self) -> Result<TestHarness, LevoError> {
        let temp_dir = tempfile::TempDir::new().map_err(LevoError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let store = Arc::new(SqliteHistoryStore::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        store.initialize().await?;

        let completion = Arc::new(match self.completion_failure {
            Some(message) => MockCompletion::failing(message),
            None => MockCompletion::with_responses(self.responses),
        });

        let engine = ContextEngine::with_persona(self.persona, &self.context);
        let service_store: Arc<dyn HistoryStore> = match self.service_store {
            Some(custom) => custom,
            None => store.clone() as Arc<dyn HistoryStore>,
        };
        let mut service = ConversationService::new(
            service_store,
            completion.clone(),
            engine,
            self.settings,
        )
        .with_clock(Arc::new(harness_date));

        let retrieval = match self.retrieval {
            RetrievalSetup::None => None,
            RetrievalSetup::Hits(hits) => Some(Arc::new(MockRetrieval::with_hits(hits))),
            RetrievalSetup::Failing(message) => Some(Arc::new(MockRetrieval::failing(message))),
        };
        if let Some(retrieval) = &retrieval {
            service = service.with_retrieval(
                retrieval.clone(),
                TriggerTable::from_config(&LevoConfig::default().triggers),
            );
        }

        Ok(TestHarness {
            service: Arc::new(service),
            completion,
            retrieval,
            store,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock collaborators and temp storage.
pub struct TestHarness {
    /// The service under test.
    pub service: Arc<ConversationService>,
    /// The mock completion provider.
    pub completion: Arc<MockCompletion>,
    /// The mock retrieval provider, when enabled.
    pub retrieval: Option<Arc<MockRetrieval>>,
    /// SQLite history store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteHistoryStore>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one non-streaming turn.
    pub async fn send(&self, user_id: &str, prompt: &str) -> Result<TurnReply, LevoError> {
        self.service.handle_turn(user_id, prompt).await
    }

    /// Everything stored for `user_id`, oldest first.
    pub async fn history(&self, user_id: &str) -> Result<Vec<String>, LevoError> {
        self.store.read_all(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_runs_a_turn_against_sqlite() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec!["hi there".into()])
            .build()
            .await
            .unwrap();

        let reply = harness.send("u1", "hello").await.unwrap();
        assert_eq!(reply.reply, "hi there");
        assert_eq!(harness.history("u1").await.unwrap(), vec!["hello", "hi there"]);
    }

    #[tokio::test]
    async fn harness_uses_fixed_date() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.send("u1", "hello").await.unwrap();

        let messages = &harness.completion.requests().await[0].messages;
        assert_eq!(messages[1].content, "Today's date is Monday, March 9, 2026.");
    }
}

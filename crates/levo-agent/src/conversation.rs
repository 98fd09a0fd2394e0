// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation service: one turn is read history, maybe search,
//! assemble, complete, persist.
//!
//! Only the completion call can fail a turn. History reads, retrieval and
//! history writes all degrade with a warning instead.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::StreamExt;
use levo_config::model::LevoConfig;
use levo_context::{ContextEngine, TriggerTable, format_hits};
use levo_core::{
    ChatMessage, ChunkStream, CompletionProvider, CompletionRequest, HealthStatus, HistoryStore,
    LevoError, PluginAdapter, RetrievalProvider,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::stream::{TurnEvent, TurnStream};
use crate::turn::{Turn, TurnState};

/// Source of "today" for the situational date line.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Result of a non-streaming turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    /// The assistant's reply text.
    pub reply: String,
    /// Whether the prompt and reply were both appended to history.
    pub persisted: bool,
    /// Number of search hits placed in the retrieved block.
    pub retrieved: usize,
}

/// Completion parameters applied to every turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Capacity of the per-turn streaming channel.
    pub stream_buffer: usize,
}

impl TurnSettings {
    pub fn from_config(config: &LevoConfig) -> Self {
        Self {
            model: config.completion.model.clone(),
            max_tokens: config.completion.max_tokens,
            temperature: config.completion.temperature,
            stream_buffer: config.server.stream_buffer,
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&LevoConfig::default())
    }
}

/// Messages for one turn plus how many hits went into them.
struct PreparedTurn {
    messages: Vec<ChatMessage>,
    retrieved: usize,
}

/// Orchestrates conversation turns over injected collaborators.
///
/// Cheap to share behind an `Arc`; each call is independent and the history
/// store is the only shared mutable state.
pub struct ConversationService {
    store: Arc<dyn HistoryStore>,
    completion: Arc<dyn CompletionProvider>,
    retrieval: Option<Arc<dyn RetrievalProvider>>,
    triggers: TriggerTable,
    engine: ContextEngine,
    settings: TurnSettings,
    clock: Clock,
}

impl ConversationService {
    /// Creates a service without retrieval. Use [`with_retrieval`](Self::with_retrieval)
    /// to enable keyword-triggered search.
    pub fn new(
        store: Arc<dyn HistoryStore>,
        completion: Arc<dyn CompletionProvider>,
        engine: ContextEngine,
        settings: TurnSettings,
    ) -> Self {
        Self {
            store,
            completion,
            retrieval: None,
            triggers: TriggerTable::default(),
            engine,
            settings,
            clock: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Enables retrieval for prompts matching `triggers`.
    pub fn with_retrieval(
        mut self,
        retrieval: Arc<dyn RetrievalProvider>,
        triggers: TriggerTable,
    ) -> Self {
        self.retrieval = Some(retrieval);
        self.triggers = triggers;
        self
    }

    /// Replaces the clock used for the date line.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    pub fn engine(&self) -> &ContextEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    /// Runs one complete turn and returns the reply.
    pub async fn handle_turn(&self, user_id: &str, prompt: &str) -> Result<TurnReply, LevoError> {
        validate_input(user_id, prompt)?;
        let mut turn = Turn::new(user_id);

        let prepared = self.prepare(&mut turn, user_id, prompt).await;
        let request = self.request(prepared.messages, false);

        turn.advance(TurnState::CompletionPending);
        let response = match self.completion.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                turn.advance(TurnState::Failed);
                warn!(turn_id = %turn.id(), error = %e, "completion failed, nothing persisted");
                return Err(LevoError::Completion(e));
            }
        };

        let persisted = persist_turn(self.store.as_ref(), user_id, prompt, &response.content).await;
        turn.advance(TurnState::Completed);
        info!(
            turn_id = %turn.id(),
            user_id,
            persisted,
            retrieved = prepared.retrieved,
            "turn completed"
        );

        Ok(TurnReply {
            reply: response.content,
            persisted,
            retrieved: prepared.retrieved,
        })
    }

    /// Starts a streaming turn.
    ///
    /// Validation, history loading, retrieval and the provider handshake all
    /// happen before this returns; errors there are returned directly. After
    /// that, fragments arrive on the returned [`TurnStream`].
    pub async fn handle_turn_streaming(
        &self,
        user_id: &str,
        prompt: &str,
    ) -> Result<TurnStream, LevoError> {
        validate_input(user_id, prompt)?;
        let mut turn = Turn::new(user_id);

        let prepared = self.prepare(&mut turn, user_id, prompt).await;
        let request = self.request(prepared.messages, true);

        turn.advance(TurnState::CompletionPending);
        let upstream = match self.completion.stream(request).await {
            Ok(upstream) => upstream,
            Err(e) => {
                turn.advance(TurnState::Failed);
                warn!(turn_id = %turn.id(), error = %e, "completion stream failed to start");
                return Err(LevoError::Completion(e));
            }
        };

        let (tx, rx) = mpsc::channel(self.settings.stream_buffer.max(1));
        tokio::spawn(produce(
            upstream,
            tx,
            Arc::clone(&self.store),
            user_id.to_string(),
            prompt.to_string(),
            turn,
        ));
        Ok(TurnStream::new(rx))
    }

    /// Every stored text for `user_id`, oldest first. Storage errors propagate.
    pub async fn get_history(&self, user_id: &str) -> Result<Vec<String>, LevoError> {
        if user_id.trim().is_empty() {
            return Err(LevoError::InvalidInput("user_id must not be empty".into()));
        }
        self.store.read_all(user_id).await
    }

    /// Health of every collaborator, keyed by adapter name.
    pub async fn health(&self) -> Vec<(String, HealthStatus)> {
        let mut adapters: Vec<&dyn PluginAdapter> = Vec::with_capacity(3);
        adapters.push(self.store.as_ref());
        adapters.push(self.completion.as_ref());
        if let Some(retrieval) = &self.retrieval {
            adapters.push(retrieval.as_ref());
        }

        let mut report = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            let status = adapter
                .health_check()
                .await
                .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
            report.push((adapter.name().to_string(), status));
        }
        report
    }

    /// Shuts down providers, then the history store.
    pub async fn shutdown(&self) -> Result<(), LevoError> {
        if let Err(e) = self.completion.shutdown().await {
            warn!(error = %e, "completion provider shutdown failed");
        }
        if let Some(retrieval) = &self.retrieval
            && let Err(e) = retrieval.shutdown().await
        {
            warn!(error = %e, "retrieval provider shutdown failed");
        }
        self.store.close().await
    }

    async fn prepare(&self, turn: &mut Turn, user_id: &str, prompt: &str) -> PreparedTurn {
        // Only the window's tail is fetched; the char budget trims it further.
        let read = match self.engine.window().max_entries {
            Some(limit) => self.store.read_recent(user_id, limit).await,
            None => self.store.read_all(user_id).await,
        };
        let history = match read {
            Ok(history) => history,
            Err(e) => {
                warn!(turn_id = %turn.id(), error = %e, "history read failed, continuing without history");
                Vec::new()
            }
        };
        turn.advance(TurnState::HistoryLoaded);

        let (retrieved_text, retrieved) = self.retrieve(turn, prompt).await;
        let today = (self.clock)();
        let messages = self
            .engine
            .build(today, &history, retrieved_text.as_deref(), prompt);
        debug!(
            turn_id = %turn.id(),
            history_entries = history.len(),
            messages = messages.len(),
            "context assembled"
        );
        turn.advance(TurnState::ContextBuilt);

        PreparedTurn {
            messages,
            retrieved,
        }
    }

    async fn retrieve(&self, turn: &Turn, prompt: &str) -> (Option<String>, usize) {
        let Some(retrieval) = &self.retrieval else {
            return (None, 0);
        };
        let Some(rule) = self.triggers.find(prompt) else {
            return (None, 0);
        };

        debug!(turn_id = %turn.id(), trigger = %rule.name, "retrieval triggered");
        match retrieval.search(prompt, rule.site_filter.as_deref()).await {
            Ok(hits) => (format_hits(&hits), hits.len()),
            Err(e) => {
                warn!(
                    turn_id = %turn.id(),
                    trigger = %rule.name,
                    error = %e,
                    "retrieval failed, continuing without retrieved links"
                );
                (None, 0)
            }
        }
    }

    fn request(&self, messages: Vec<ChatMessage>, stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stream,
        }
    }
}

fn validate_input(user_id: &str, prompt: &str) -> Result<(), LevoError> {
    if user_id.trim().is_empty() {
        return Err(LevoError::InvalidInput("user_id must not be empty".into()));
    }
    if prompt.trim().is_empty() {
        return Err(LevoError::InvalidInput("prompt must not be empty".into()));
    }
    Ok(())
}

/// Appends prompt and reply as one pair; either both land or neither does.
async fn persist_turn(store: &dyn HistoryStore, user_id: &str, prompt: &str, reply: &str) -> bool {
    match store.append_turn(user_id, prompt, reply).await {
        Ok(_) => true,
        Err(e) => {
            warn!(user_id, error = %e, "failed to persist turn");
            false
        }
    }
}

/// Producer task of a streaming turn.
async fn produce(
    mut upstream: ChunkStream,
    tx: mpsc::Sender<TurnEvent>,
    store: Arc<dyn HistoryStore>,
    user_id: String,
    prompt: String,
    mut turn: Turn,
) {
    let mut reply = String::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => None,
            next = upstream.next() => Some(next),
        };

        match next {
            None => {
                abandon(&mut turn);
                return;
            }
            Some(Some(Ok(chunk))) => {
                if chunk.delta.is_empty() {
                    continue;
                }
                reply.push_str(&chunk.delta);
                if tx.send(TurnEvent::Delta(chunk.delta)).await.is_err() {
                    abandon(&mut turn);
                    return;
                }
            }
            Some(Some(Err(e))) => {
                turn.advance(TurnState::Failed);
                warn!(turn_id = %turn.id(), error = %e, "completion stream failed, nothing persisted");
                let _ = tx
                    .send(TurnEvent::Error(LevoError::Completion(e).to_string()))
                    .await;
                return;
            }
            Some(None) => break,
        }
    }

    if tx.is_closed() {
        abandon(&mut turn);
        return;
    }

    let persisted = persist_turn(store.as_ref(), &user_id, &prompt, &reply).await;
    turn.advance(TurnState::Completed);
    info!(turn_id = %turn.id(), user_id = %user_id, persisted, "streaming turn completed");
    let _ = tx.send(TurnEvent::Done { persisted }).await;
}

fn abandon(turn: &mut Turn) {
    turn.advance(TurnState::Failed);
    debug!(turn_id = %turn.id(), "stream consumer dropped, turn abandoned");
}

#[cfg(test)]
mod tests {
    use super::*;
    use levo_config::model::ContextConfig;
    use levo_core::SearchHit;
    use levo_test_utils::{FailingHistoryStore, MemoryHistoryStore, MockCompletion, MockRetrieval};
    use tracing_test::traced_test;

    fn engine() -> ContextEngine {
        let context = ContextConfig {
            include_date: false,
            ..ContextConfig::default()
        };
        ContextEngine::with_persona("You are a test persona.", &context)
    }

    fn service(
        store: Arc<dyn HistoryStore>,
        completion: Arc<MockCompletion>,
    ) -> ConversationService {
        ConversationService::new(store, completion, engine(), TurnSettings::default())
    }

    #[tokio::test]
    async fn successful_turn_persists_prompt_then_reply() {
        let store = Arc::new(MemoryHistoryStore::new());
        let completion = Arc::new(MockCompletion::with_responses(vec!["hi there".into()]));
        let svc = service(store.clone(), completion);

        let reply = svc.handle_turn("u1", "hello").await.unwrap();
        assert_eq!(
            reply,
            TurnReply {
                reply: "hi there".into(),
                persisted: true,
                retrieved: 0
            }
        );
        assert_eq!(svc.get_history("u1").await.unwrap(), vec!["hello", "hi there"]);
    }

    #[tokio::test]
    async fn blank_inputs_are_rejected_before_any_io() {
        let store = Arc::new(MemoryHistoryStore::new());
        let completion = Arc::new(MockCompletion::new());
        let svc = service(store.clone(), completion.clone());

        for (user, prompt) in [("u1", ""), ("u1", "   \n"), ("", "hello")] {
            let err = svc.handle_turn(user, prompt).await.unwrap_err();
            assert!(err.is_invalid_input(), "{user:?}/{prompt:?}: {err}");
        }
        assert!(completion.requests().await.is_empty());
        assert!(store.read_all("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn completion_failure_persists_nothing() {
        let store = Arc::new(MemoryHistoryStore::new());
        let completion = Arc::new(MockCompletion::failing("model overloaded"));
        let svc = service(store.clone(), completion);

        let err = svc.handle_turn("u1", "hello").await.unwrap_err();
        assert!(matches!(err, LevoError::Completion(_)), "got {err}");
        assert!(store.read_all("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_read_failure_degrades_to_empty_history() {
        let store = Arc::new(FailingHistoryStore::reads());
        let completion = Arc::new(MockCompletion::with_responses(vec!["ok".into()]));
        let svc = service(store, completion.clone());

        let reply = svc.handle_turn("u1", "hello").await.unwrap();
        assert_eq!(reply.reply, "ok");

        let requests = completion.requests().await;
        let contents: Vec<_> = requests[0].messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["You are a test persona.", "hello"]);
    }

    #[tokio::test]
    async fn append_failure_still_returns_reply() {
        let store = Arc::new(FailingHistoryStore::writes());
        let completion = Arc::new(MockCompletion::with_responses(vec!["ok".into()]));
        let svc = service(store, completion);

        let reply = svc.handle_turn("u1", "hello").await.unwrap();
        assert_eq!(reply.reply, "ok");
        assert!(!reply.persisted);
    }

    #[tokio::test]
    async fn prior_history_is_replayed_in_order() {
        let store = Arc::new(MemoryHistoryStore::new());
        let completion = Arc::new(MockCompletion::with_responses(vec![
            "first reply".into(),
            "second reply".into(),
        ]));
        let svc = service(store, completion.clone());

        svc.handle_turn("u1", "first").await.unwrap();
        svc.handle_turn("u1", "second").await.unwrap();

        let requests = completion.requests().await;
        let history = &requests[1].messages[1];
        assert_eq!(history.content, "Conversation so far:\nfirst\nfirst reply");
        assert_eq!(requests[1].messages.last().unwrap().content, "second");
        assert!(!requests[1].stream);
    }

    #[tokio::test]
    async fn only_the_window_tail_is_read_from_the_store() {
        let store = Arc::new(MemoryHistoryStore::new());
        for i in 0..500 {
            store.append("u1", &format!("old {i}")).await.unwrap();
        }
        let completion = Arc::new(MockCompletion::new());
        let context = ContextConfig {
            include_date: false,
            history_max_entries: 2,
            ..ContextConfig::default()
        };
        let svc = ConversationService::new(
            store.clone(),
            completion.clone(),
            ContextEngine::with_persona("p", &context),
            TurnSettings::default(),
        );

        svc.handle_turn("u1", "new").await.unwrap();
        assert_eq!(store.rows_read(), 2);
        assert_eq!(
            completion.requests().await[0].messages[1].content,
            "Conversation so far:\nold 498\nold 499"
        );
    }

    #[tokio::test]
    async fn triggered_retrieval_lands_before_user_message() {
        let store = Arc::new(MemoryHistoryStore::new());
        let completion = Arc::new(MockCompletion::with_responses(vec!["here you go".into()]));
        let retrieval = Arc::new(MockRetrieval::with_hits(vec![
            SearchHit {
                title: "Boots".into(),
                url: "https://amazon.com/boots".into(),
            },
            SearchHit {
                title: "Socks".into(),
                url: "https://amazon.com/socks".into(),
            },
        ]));
        let svc = service(store, completion.clone()).with_retrieval(
            retrieval.clone(),
            TriggerTable::from_config(&LevoConfig::default().triggers),
        );

        let reply = svc.handle_turn("u1", "find boots on Amazon").await.unwrap();
        assert_eq!(reply.retrieved, 2);
        assert_eq!(
            retrieval.calls().await,
            vec![("find boots on Amazon".to_string(), Some("amazon.com".to_string()))]
        );

        let messages = &completion.requests().await[0].messages;
        let n = messages.len();
        assert_eq!(
            messages[n - 2].content,
            "Verified links:\n- Boots: https://amazon.com/boots\n- Socks: https://amazon.com/socks"
        );
        assert_eq!(messages[n - 1].content, "find boots on Amazon");
    }

    #[tokio::test]
    async fn untriggered_prompt_skips_retrieval() {
        let completion = Arc::new(MockCompletion::new());
        let retrieval = Arc::new(MockRetrieval::with_hits(vec![]));
        let svc = service(Arc::new(MemoryHistoryStore::new()), completion).with_retrieval(
            retrieval.clone(),
            TriggerTable::from_config(&LevoConfig::default().triggers),
        );

        svc.handle_turn("u1", "tell me a joke").await.unwrap();
        assert!(retrieval.calls().await.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn retrieval_failure_degrades_to_no_block() {
        let completion = Arc::new(MockCompletion::with_responses(vec!["fine".into()]));
        let svc = service(Arc::new(MemoryHistoryStore::new()), completion.clone())
            .with_retrieval(
                Arc::new(MockRetrieval::failing("quota exceeded")),
                TriggerTable::from_config(&LevoConfig::default().triggers),
            );

        let reply = svc.handle_turn("u1", "youtube cat videos").await.unwrap();
        assert_eq!(reply.retrieved, 0);
        let messages = &completion.requests().await[0].messages;
        assert!(messages.iter().all(|m| !m.content.starts_with("Verified links:")));
        assert!(logs_contain("retrieval failed"));
    }

    #[tokio::test]
    async fn clock_drives_date_line() {
        let completion = Arc::new(MockCompletion::new());
        let svc = ConversationService::new(
            Arc::new(MemoryHistoryStore::new()),
            completion.clone(),
            ContextEngine::with_persona("p", &ContextConfig::default()),
            TurnSettings::default(),
        )
        .with_clock(Arc::new(|| NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()));

        svc.handle_turn("u1", "what day is it").await.unwrap();
        let messages = &completion.requests().await[0].messages;
        assert_eq!(messages[1].content, "Today's date is Monday, March 9, 2026.");
    }

    #[tokio::test]
    async fn request_uses_configured_settings() {
        let completion = Arc::new(MockCompletion::new());
        let settings = TurnSettings {
            model: "llama-3.3-70b-versatile".into(),
            max_tokens: 256,
            temperature: Some(0.4),
            stream_buffer: 8,
        };
        let svc = ConversationService::new(
            Arc::new(MemoryHistoryStore::new()),
            completion.clone(),
            engine(),
            settings,
        );

        svc.handle_turn("u1", "hi").await.unwrap();
        let request = &completion.requests().await[0];
        assert_eq!(request.model, "llama-3.3-70b-versatile");
        assert_eq!(request.max_tokens, 256);
        assert_eq!(request.temperature, Some(0.4));
    }

    #[tokio::test]
    async fn streaming_turn_emits_deltas_then_single_done() {
        let store = Arc::new(MemoryHistoryStore::new());
        let completion = Arc::new(MockCompletion::new());
        completion
            .push_stream(vec!["hi".into(), "".into(), " there".into()])
            .await;
        let svc = service(store.clone(), completion.clone());

        let events = svc
            .handle_turn_streaming("u1", "hello")
            .await
            .unwrap()
            .collect_events()
            .await;
        assert_eq!(
            events,
            vec![
                TurnEvent::Delta("hi".into()),
                TurnEvent::Delta(" there".into()),
                TurnEvent::Done { persisted: true },
            ]
        );
        assert_eq!(store.read_all("u1").await.unwrap(), vec!["hello", "hi there"]);
        assert!(completion.requests().await[0].stream);
    }

    #[tokio::test]
    async fn streaming_error_emits_error_and_persists_nothing() {
        let store = Arc::new(MemoryHistoryStore::new());
        let completion = Arc::new(MockCompletion::new());
        completion
            .push_stream_failure(vec!["partial".into()], "connection reset")
            .await;
        let svc = service(store.clone(), completion);

        let events = svc
            .handle_turn_streaming("u1", "hello")
            .await
            .unwrap()
            .collect_events()
            .await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], TurnEvent::Delta("partial".into()));
        match &events[1] {
            TurnEvent::Error(message) => assert!(message.contains("connection reset")),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(store.read_all("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn streaming_start_failure_is_returned_directly() {
        let svc = service(
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(MockCompletion::failing("bad key")),
        );
        let err = svc.handle_turn_streaming("u1", "hello").await.unwrap_err();
        assert!(matches!(err, LevoError::Completion(_)));
    }

    #[tokio::test]
    async fn health_lists_every_collaborator() {
        let svc = service(
            Arc::new(MemoryHistoryStore::new()),
            Arc::new(MockCompletion::new()),
        )
        .with_retrieval(
            Arc::new(MockRetrieval::with_hits(vec![])),
            TriggerTable::default(),
        );

        let names: Vec<_> = svc.health().await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["memory", "mock-completion", "mock-retrieval"]);
    }

    #[tokio::test]
    async fn get_history_propagates_storage_errors() {
        let svc = service(
            Arc::new(FailingHistoryStore::reads()),
            Arc::new(MockCompletion::new()),
        );
        assert!(matches!(
            svc.get_history("u1").await,
            Err(LevoError::Storage { .. })
        ));
    }
}

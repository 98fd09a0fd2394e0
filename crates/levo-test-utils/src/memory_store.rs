// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory history stores for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use levo_core::{AdapterType, HealthStatus, HistoryEntry, HistoryStore, LevoError, PluginAdapter};

/// A `HistoryStore` backed by a `Vec`. Same ordering and isolation rules as
/// the SQLite store, without the file.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
    rows_read: AtomicUsize,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total texts returned by `read_all` and `read_recent` so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read.load(Ordering::SeqCst)
    }

    async fn texts(&self, user_id: &str) -> Vec<String> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.text.clone())
            .collect()
    }

    fn tally(&self, texts: Vec<String>) -> Vec<String> {
        self.rows_read.fetch_add(texts.len(), Ordering::SeqCst);
        texts
    }
}

fn require_user(user_id: &str) -> Result<(), LevoError> {
    if user_id.is_empty() {
        return Err(LevoError::InvalidInput("user_id must not be empty".into()));
    }
    Ok(())
}

fn push_entry(entries: &mut Vec<HistoryEntry>, user_id: &str, text: &str) -> HistoryEntry {
    let entry = HistoryEntry {
        sequence: entries.len() as i64 + 1,
        user_id: user_id.to_string(),
        text: text.to_string(),
        created_at: chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string(),
    };
    entries.push(entry.clone());
    entry
}

#[async_trait]
impl PluginAdapter for MemoryHistoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LevoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LevoError> {
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn initialize(&self) -> Result<(), LevoError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), LevoError> {
        Ok(())
    }

    async fn append(&self, user_id: &str, text: &str) -> Result<HistoryEntry, LevoError> {
        require_user(user_id)?;
        let mut entries = self.entries.lock().await;
        Ok(push_entry(&mut entries, user_id, text))
    }

    async fn append_turn(
        &self,
        user_id: &str,
        prompt: &str,
        reply: &str,
    ) -> Result<(HistoryEntry, HistoryEntry), LevoError> {
        require_user(user_id)?;
        let mut entries = self.entries.lock().await;
        let prompt = push_entry(&mut entries, user_id, prompt);
        let reply = push_entry(&mut entries, user_id, reply);
        Ok((prompt, reply))
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<String>, LevoError> {
        Ok(self.tally(self.texts(user_id).await))
    }

    async fn read_recent(&self, user_id: &str, limit: usize) -> Result<Vec<String>, LevoError> {
        let texts = self.texts(user_id).await;
        let skip = texts.len().saturating_sub(limit);
        Ok(self.tally(texts.into_iter().skip(skip).collect()))
    }

    async fn entries_after(
        &self,
        user_id: &str,
        after_sequence: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, LevoError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|e| e.user_id == user_id && e.sequence > after_sequence)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, user_id: &str) -> Result<u64, LevoError> {
        Ok(self.texts(user_id).await.len() as u64)
    }
}

/// A store whose reads and/or writes always fail with a storage error.
///
/// Operations that are not set to fail are delegated to an inner
/// [`MemoryHistoryStore`].
pub struct FailingHistoryStore {
    inner: MemoryHistoryStore,
    fail_reads: bool,
    fail_writes: bool,
}

impl FailingHistoryStore {
    /// Reads fail; appends succeed.
    pub fn reads() -> Self {
        Self::new(true, false)
    }

    /// Appends fail; reads succeed.
    pub fn writes() -> Self {
        Self::new(false, true)
    }

    /// Everything fails.
    pub fn all() -> Self {
        Self::new(true, true)
    }

    fn new(fail_reads: bool, fail_writes: bool) -> Self {
        Self {
            inner: MemoryHistoryStore::new(),
            fail_reads,
            fail_writes,
        }
    }

    fn check_read(&self) -> Result<(), LevoError> {
        if self.fail_reads {
            return Err(LevoError::storage("simulated read failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for FailingHistoryStore {
    fn name(&self) -> &str {
        "failing"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LevoError> {
        Ok(HealthStatus::Unhealthy("simulated failure".into()))
    }

    async fn shutdown(&self) -> Result<(), LevoError> {
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FailingHistoryStore {
    async fn initialize(&self) -> Result<(), LevoError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), LevoError> {
        Ok(())
    }

    async fn append(&self, user_id: &str, text: &str) -> Result<HistoryEntry, LevoError> {
        if self.fail_writes {
            return Err(LevoError::storage("simulated write failure"));
        }
        self.inner.append(user_id, text).await
    }

    async fn append_turn(
        &self,
        user_id: &str,
        prompt: &str,
        reply: &str,
    ) -> Result<(HistoryEntry, HistoryEntry), LevoError> {
        if self.fail_writes {
            return Err(LevoError::storage("simulated write failure"));
        }
        self.inner.append_turn(user_id, prompt, reply).await
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<String>, LevoError> {
        self.check_read()?;
        self.inner.read_all(user_id).await
    }

    async fn read_recent(&self, user_id: &str, limit: usize) -> Result<Vec<String>, LevoError> {
        self.check_read()?;
        self.inner.read_recent(user_id, limit).await
    }

    async fn entries_after(
        &self,
        user_id: &str,
        after_sequence: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, LevoError> {
        self.check_read()?;
        self.inner.entries_after(user_id, after_sequence, limit).await
    }

    async fn count(&self, user_id: &str) -> Result<u64, LevoError> {
        self.check_read()?;
        self.inner.count(user_id).await
    }
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`HistoryStore`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use levo_config::model::StorageConfig;
use levo_core::{
    AdapterType, HealthStatus, HistoryEntry, HistoryStore, LevoError, PluginAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed history store.
///
/// The database is opened by [`HistoryStore::initialize`]; every other
/// operation fails with [`LevoError::Storage`] until then.
pub struct SqliteHistoryStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteHistoryStore {
    /// Create a store for the configured path. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, LevoError> {
        self.db
            .get()
            .ok_or_else(|| LevoError::storage("history store not initialized; call initialize() first"))
    }
}

fn require_user(user_id: &str) -> Result<(), LevoError> {
    if user_id.is_empty() {
        return Err(LevoError::InvalidInput("user_id must not be empty".into()));
    }
    Ok(())
}

#[async_trait]
impl PluginAdapter for SqliteHistoryStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LevoError> {
        let db = self.db()?;
        let ping = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);
        Ok(match ping {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), LevoError> {
        if self.db.get().is_some() {
            self.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn initialize(&self) -> Result<(), LevoError> {
        let path = &self.config.database_path;
        let db = Database::open_with(path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| LevoError::storage("history store already initialized"))?;
        debug!(path = %path, "SQLite history store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LevoError> {
        self.db()?.checkpoint().await
    }

    async fn append(&self, user_id: &str, text: &str) -> Result<HistoryEntry, LevoError> {
        require_user(user_id)?;
        let entry = queries::history::append(self.db()?, user_id, text).await?;
        debug!(user_id, sequence = entry.sequence, "history entry appended");
        Ok(entry)
    }

    async fn append_turn(
        &self,
        user_id: &str,
        prompt: &str,
        reply: &str,
    ) -> Result<(HistoryEntry, HistoryEntry), LevoError> {
        require_user(user_id)?;
        let (prompt, reply) = queries::history::append_turn(self.db()?, user_id, prompt, reply).await?;
        debug!(
            user_id,
            prompt_sequence = prompt.sequence,
            reply_sequence = reply.sequence,
            "turn appended"
        );
        Ok((prompt, reply))
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<String>, LevoError> {
        require_user(user_id)?;
        queries::history::read_all(self.db()?, user_id).await
    }

    async fn read_recent(&self, user_id: &str, limit: usize) -> Result<Vec<String>, LevoError> {
        require_user(user_id)?;
        queries::history::read_recent(self.db()?, user_id, limit).await
    }

    async fn entries_after(
        &self,
        user_id: &str,
        after_sequence: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, LevoError> {
        require_user(user_id)?;
        queries::history::entries_after(self.db()?, user_id, after_sequence, limit).await
    }

    async fn count(&self, user_id: &str) -> Result<u64, LevoError> {
        require_user(user_id)?;
        queries::history::count(self.db()?, user_id).await
    }
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History store trait: the durable, append-only per-user message log.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt};

use crate::error::LevoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::HistoryEntry;

/// Append-only log of `(user_id, text)` rows.
///
/// Entries are never mutated or deleted. Reads for one user never return
/// another user's rows and always come back oldest first.
#[async_trait]
pub trait HistoryStore: PluginAdapter {
    /// Opens the backend (connection, PRAGMAs, migrations).
    async fn initialize(&self) -> Result<(), LevoError>;

    /// Flushes pending writes and releases the backend.
    async fn close(&self) -> Result<(), LevoError>;

    /// Durably appends one entry and returns it with its assigned sequence.
    async fn append(&self, user_id: &str, text: &str) -> Result<HistoryEntry, LevoError>;

    /// Durably appends a prompt and its reply as one unit.
    ///
    /// Both rows are committed with adjacent sequences, or neither is.
    async fn append_turn(
        &self,
        user_id: &str,
        prompt: &str,
        reply: &str,
    ) -> Result<(HistoryEntry, HistoryEntry), LevoError>;

    /// Returns every text for `user_id`, oldest first. Unknown users yield an empty vec.
    async fn read_all(&self, user_id: &str) -> Result<Vec<String>, LevoError>;

    /// Returns the most recent `limit` texts for `user_id`, oldest first.
    async fn read_recent(&self, user_id: &str, limit: usize) -> Result<Vec<String>, LevoError>;

    /// Returns up to `limit` entries with `sequence > after_sequence`, oldest first.
    async fn entries_after(
        &self,
        user_id: &str,
        after_sequence: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, LevoError>;

    /// Number of entries stored for `user_id`.
    async fn count(&self, user_id: &str) -> Result<u64, LevoError>;
}

/// Lazily walks a user's history page by page, oldest first.
///
/// Only one page of `page_size` entries is held in memory at a time, so
/// this is the preferred way to replay very long histories.
pub fn history_stream(
    store: Arc<dyn HistoryStore>,
    user_id: String,
    page_size: usize,
) -> impl Stream<Item = Result<HistoryEntry, LevoError>> + Send {
    let page_size = page_size.max(1);
    stream::try_unfold(
        (store, user_id, 0_i64, false),
        move |(store, user_id, cursor, exhausted)| async move {
            if exhausted {
                return Ok::<_, LevoError>(None);
            }
            let page = store.entries_after(&user_id, cursor, page_size).await?;
            let exhausted = page.len() < page_size;
            let cursor = page.last().map(|e| e.sequence).unwrap_or(cursor);
            let items = stream::iter(page.into_iter().map(Ok::<_, LevoError>));
            Ok::<_, LevoError>(Some((items, (store, user_id, cursor, exhausted))))
        },
    )
    .try_flatten()
}

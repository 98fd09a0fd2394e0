// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History log queries.
//!
//! Rows are only ever inserted. Every read is scoped to one `user_id` and
//! ordered by `sequence`, which SQLite assigns monotonically.

use levo_core::{HistoryEntry, LevoError};
use rusqlite::{Row, params};

use crate::database::{Database, map_tr_err};

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        sequence: row.get(0)?,
        user_id: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn now_rfc3339() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

fn to_sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Insert one entry and return it with the sequence SQLite assigned.
pub async fn append(db: &Database, user_id: &str, text: &str) -> Result<HistoryEntry, LevoError> {
    let user_id = user_id.to_string();
    let text = text.to_string();
    let created_at = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO history (user_id, text, created_at) VALUES (?1, ?2, ?3)",
                params![user_id, text, created_at],
            )?;
            Ok(HistoryEntry {
                sequence: conn.last_insert_rowid(),
                user_id,
                text,
                created_at,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a prompt and its reply in one transaction.
///
/// The pair is committed together and gets adjacent sequences, so concurrent
/// turns for the same user never interleave.
pub async fn append_turn(
    db: &Database,
    user_id: &str,
    prompt: &str,
    reply: &str,
) -> Result<(HistoryEntry, HistoryEntry), LevoError> {
    let user_id = user_id.to_string();
    let prompt = prompt.to_string();
    let reply = reply.to_string();
    let created_at = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let insert = |text: String| -> rusqlite::Result<HistoryEntry> {
                tx.execute(
                    "INSERT INTO history (user_id, text, created_at) VALUES (?1, ?2, ?3)",
                    params![user_id, text, created_at],
                )?;
                Ok(HistoryEntry {
                    sequence: tx.last_insert_rowid(),
                    user_id: user_id.clone(),
                    text,
                    created_at: created_at.clone(),
                })
            };
            let pair = (insert(prompt)?, insert(reply)?);
            tx.commit()?;
            Ok(pair)
        })
        .await
        .map_err(map_tr_err)
}

/// All texts for `user_id`, oldest first.
pub async fn read_all(db: &Database, user_id: &str) -> Result<Vec<String>, LevoError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT text FROM history WHERE user_id = ?1 ORDER BY sequence ASC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<Vec<String>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// The newest `limit` texts for `user_id`, returned oldest first.
pub async fn read_recent(
    db: &Database,
    user_id: &str,
    limit: usize,
) -> Result<Vec<String>, LevoError> {
    let user_id = user_id.to_string();
    let limit = to_sql_limit(limit);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT text FROM (
                     SELECT sequence, text FROM history WHERE user_id = ?1
                     ORDER BY sequence DESC LIMIT ?2
                 ) ORDER BY sequence ASC",
            )?;
            let rows = stmt.query_map(params![user_id, limit], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<Vec<String>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Up to `limit` entries after `after_sequence` (keyset pagination).
pub async fn entries_after(
    db: &Database,
    user_id: &str,
    after_sequence: i64,
    limit: usize,
) -> Result<Vec<HistoryEntry>, LevoError> {
    let user_id = user_id.to_string();
    let limit = to_sql_limit(limit);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT sequence, user_id, text, created_at FROM history
                 WHERE user_id = ?1 AND sequence > ?2
                 ORDER BY sequence ASC LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![user_id, after_sequence, limit], entry_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count(db: &Database, user_id: &str) -> Result<u64, LevoError> {
    let user_id = user_id.to_string();
    let n: i64 = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM history WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(n.max(0) as u64)
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every [`Database::open`](crate::Database::open).

use levo_core::LevoError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations. Already-applied versions are skipped, so
/// reopening an existing database is a no-op.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), LevoError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(LevoError::storage)?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod completion;
pub mod history;
pub mod retrieval;

pub use adapter::PluginAdapter;
pub use completion::{ChunkStream, CompletionProvider};
pub use history::{HistoryStore, history_stream};
pub use retrieval::RetrievalProvider;

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Levo.
//!
//! This crate provides the trait definitions, error types, and common types
//! shared by the history store, the context assembler, the conversation
//! service, and the remote collaborators.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{LevoError, UpstreamError};
pub use types::{
    AdapterType, ChatMessage, CompletionChunk, CompletionRequest, CompletionResponse,
    ContextSegment, HealthStatus, HistoryEntry, Role, SearchHit, SegmentKind, TokenUsage,
};

pub use traits::{
    ChunkStream, CompletionProvider, HistoryStore, PluginAdapter, RetrievalProvider,
    history_stream,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levo_error_has_all_variants() {
        let _config = LevoError::Config("test".into());
        let _input = LevoError::InvalidInput("test".into());
        let _storage = LevoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _upstream = LevoError::Upstream(UpstreamError::new("search", "test"));
        let _completion = LevoError::Completion(UpstreamError::new("groq", "test"));
        let _internal = LevoError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_history_store<T: HistoryStore>() {}
        fn _assert_completion_provider<T: CompletionProvider>() {}
        fn _assert_retrieval_provider<T: RetrievalProvider>() {}
    }
}

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Levo integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockCompletion`] - Mock completion provider with queued replies and scripted streams
//! - [`MockRetrieval`] - Mock search provider with fixed hits or a fixed failure
//! - [`MemoryHistoryStore`] / [`FailingHistoryStore`] - In-memory stores
//! - [`TestHarness`] - Conversation service over a temp SQLite store

pub mod harness;
pub mod memory_store;
pub mod mock_completion;
pub mod mock_retrieval;

pub use harness::{TestHarness, TestHarnessBuilder, harness_date};
pub use memory_store::{FailingHistoryStore, MemoryHistoryStore};
pub use mock_completion::MockCompletion;
pub use mock_retrieval::MockRetrieval;

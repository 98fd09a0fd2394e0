// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation orchestration for Levo.
//!
//! [`ConversationService`] wires the history store, the context engine and
//! the remote collaborators into single turns, either as one reply
//! ([`ConversationService::handle_turn`]) or as a stream of fragments
//! ([`ConversationService::handle_turn_streaming`]).

pub mod conversation;
pub mod shutdown;
pub mod stream;
pub mod turn;

pub use conversation::{Clock, ConversationService, TurnReply, TurnSettings};
pub use shutdown::install_signal_handler;
pub use stream::{TurnEvent, TurnStream};
pub use turn::{Turn, TurnState};

// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn state tracking.
//!
//! Every inbound message gets a [`Turn`] with a fresh id. The id is attached
//! to each state transition log line so a single request can be followed
//! through history loading, context assembly and the completion call.

use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle of a single conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Input validated, nothing loaded yet.
    Received,
    /// History read (or degraded to empty).
    HistoryLoaded,
    /// Prompt messages assembled.
    ContextBuilt,
    /// Waiting on the completion provider.
    CompletionPending,
    /// Reply produced; persistence attempted.
    Completed,
    /// Completion failed or the consumer went away.
    Failed,
}

impl TurnState {
    /// Whether the turn has reached a final state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: TurnState) -> bool {
        use TurnState::*;
        match (self, next) {
            (Received, HistoryLoaded)
            | (HistoryLoaded, ContextBuilt)
            | (ContextBuilt, CompletionPending)
            | (CompletionPending, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnState::Received => write!(f, "received"),
            TurnState::HistoryLoaded => write!(f, "history_loaded"),
            TurnState::ContextBuilt => write!(f, "context_built"),
            TurnState::CompletionPending => write!(f, "completion_pending"),
            TurnState::Completed => write!(f, "completed"),
            TurnState::Failed => write!(f, "failed"),
        }
    }
}

/// A single turn in flight.
#[derive(Debug)]
pub struct Turn {
    id: Uuid,
    user_id: String,
    state: TurnState,
}

impl Turn {
    /// Starts a new turn in [`TurnState::Received`].
    pub fn new(user_id: &str) -> Self {
        let turn = Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            state: TurnState::Received,
        };
        debug!(turn_id = %turn.id, user_id = %turn.user_id, state = %turn.state, "turn received");
        turn
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Moves to `next`, logging the transition.
    ///
    /// Illegal transitions are logged and ignored; the state is left unchanged.
    pub fn advance(&mut self, next: TurnState) {
        if !self.state.can_transition_to(next) {
            warn!(
                turn_id = %self.id,
                from = %self.state,
                to = %next,
                "ignoring illegal turn transition"
            );
            return;
        }
        debug!(
            turn_id = %self.id,
            user_id = %self.user_id,
            from = %self.state,
            to = %next,
            "turn state transition"
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        let mut turn = Turn::new("u1");
        for next in [
            TurnState::HistoryLoaded,
            TurnState::ContextBuilt,
            TurnState::CompletionPending,
            TurnState::Completed,
        ] {
            turn.advance(next);
            assert_eq!(turn.state(), next);
        }
        assert!(turn.state().is_terminal());
    }

    #[test]
    fn any_live_state_can_fail() {
        for from in [
            TurnState::Received,
            TurnState::HistoryLoaded,
            TurnState::ContextBuilt,
            TurnState::CompletionPending,
        ] {
            assert!(from.can_transition_to(TurnState::Failed), "{from}");
        }
        assert!(!TurnState::Completed.can_transition_to(TurnState::Failed));
        assert!(!TurnState::Failed.can_transition_to(TurnState::Failed));
    }

    #[test]
    fn skipping_states_is_ignored() {
        let mut turn = Turn::new("u1");
        turn.advance(TurnState::Completed);
        assert_eq!(turn.state(), TurnState::Received);
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(TurnState::CompletionPending.to_string(), "completion_pending");
        assert_eq!(TurnState::HistoryLoaded.to_string(), "history_loaded");
    }

    #[test]
    fn turn_ids_are_unique() {
        assert_ne!(Turn::new("a").id(), Turn::new("a").id());
    }
}

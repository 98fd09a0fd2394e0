// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `levo chat` and `levo history` command implementations.

use std::io::Write;

use futures::StreamExt;
use levo_agent::TurnEvent;
use levo_config::model::LevoConfig;
use levo_core::{HistoryStore, LevoError};
use tracing::warn;

use crate::serve::{build_service, open_store};

/// Runs one turn for `user_id` and prints the reply to stdout.
pub async fn run_chat(
    config: LevoConfig,
    user_id: &str,
    prompt: &str,
    stream: bool,
) -> Result<(), LevoError> {
    let service = build_service(&config).await?;

    let outcome = if stream {
        stream_turn(&service, user_id, prompt).await
    } else {
        service.handle_turn(user_id, prompt).await.map(|turn| {
            println!("{}", turn.reply);
            if !turn.persisted {
                eprintln!("warning: reply was not saved to history");
            }
        })
    };

    settle(outcome, service.shutdown().await)
}

/// The turn's outcome wins; a failed shutdown is only logged.
fn settle(outcome: Result<(), LevoError>, shutdown: Result<(), LevoError>) -> Result<(), LevoError> {
    if let Err(e) = shutdown {
        warn!(error = %e, "history store did not close cleanly");
    }
    outcome
}

async fn stream_turn(
    service: &levo_agent::ConversationService,
    user_id: &str,
    prompt: &str,
) -> Result<(), LevoError> {
    let mut events = service.handle_turn_streaming(user_id, prompt).await?;
    let mut stdout = std::io::stdout();

    while let Some(event) = events.next().await {
        match event {
            TurnEvent::Delta(text) => {
                print!("{text}");
                let _ = stdout.flush();
            }
            TurnEvent::Done { persisted } => {
                println!();
                if !persisted {
                    eprintln!("warning: reply was not saved to history");
                }
            }
            TurnEvent::Error(message) => {
                println!();
                return Err(LevoError::Internal(message));
            }
        }
    }
    Ok(())
}

/// Prints every stored entry for `user_id`, one per line.
pub async fn run_history(config: LevoConfig, user_id: &str) -> Result<(), LevoError> {
    let store = open_store(&config).await?;
    let entries = store.read_all(user_id).await;
    store.close().await?;

    for entry in entries? {
        println!("{entry}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_failure_does_not_mask_the_turn() {
        assert!(settle(Ok(()), Err(LevoError::storage("checkpoint failed"))).is_ok());

        let err = settle(
            Err(LevoError::InvalidInput("prompt must not be empty".into())),
            Err(LevoError::storage("checkpoint failed")),
        )
        .unwrap_err();
        assert!(err.is_invalid_input());
    }
}

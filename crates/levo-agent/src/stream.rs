// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consumer side of a streaming turn.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::mpsc;

/// One event delivered to the consumer of a streaming turn.
///
/// A well-formed stream is zero or more `Delta`s followed by exactly one
/// `Done` or one `Error`; nothing follows the terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// The next fragment of the reply.
    Delta(String),
    /// The reply finished. `persisted` reports whether both entries were stored.
    Done { persisted: bool },
    /// The completion provider failed mid-stream. Nothing was persisted.
    Error(String),
}

impl TurnEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Delta(_))
    }
}

/// Receiver half of a streaming turn.
///
/// Dropping it cancels the turn: the producer stops reading the provider
/// stream and the turn is not persisted.
#[derive(Debug)]
pub struct TurnStream {
    rx: mpsc::Receiver<TurnEvent>,
}

impl TurnStream {
    pub(crate) fn new(rx: mpsc::Receiver<TurnEvent>) -> Self {
        Self { rx }
    }

    /// Waits for the next event. `None` once the producer has finished.
    pub async fn recv(&mut self) -> Option<TurnEvent> {
        self.rx.recv().await
    }

    /// Drains the stream, returning every event in order.
    pub async fn collect_events(mut self) -> Vec<TurnEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}

impl Stream for TurnStream {
    type Item = TurnEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<TurnEvent>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn stream_yields_events_in_send_order() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(TurnEvent::Delta("a".into())).await.unwrap();
        tx.send(TurnEvent::Done { persisted: true }).await.unwrap();
        drop(tx);

        let events: Vec<_> = TurnStream::new(rx).collect().await;
        assert_eq!(
            events,
            vec![
                TurnEvent::Delta("a".into()),
                TurnEvent::Done { persisted: true }
            ]
        );
    }

    #[test]
    fn only_delta_is_non_terminal() {
        assert!(!TurnEvent::Delta(String::new()).is_terminal());
        assert!(TurnEvent::Done { persisted: false }.is_terminal());
        assert!(TurnEvent::Error("x".into()).is_terminal());
    }
}

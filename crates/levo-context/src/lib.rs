// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt context assembly for Levo.
//!
//! A prompt is built from four labelled segments in a fixed order:
//! - **Persona**: the agent's system instructions
//! - **Situational**: today's date and operator-supplied facts
//! - **History**: the user's earlier messages, bounded by a [`HistoryWindow`]
//! - **Retrieved**: verified links from a triggered web search
//!
//! followed by the user's new message. [`assemble`] is pure; everything that
//! touches the outside world (clock, store, search) happens in the caller.

pub mod history;
pub mod persona;
pub mod retrieval;
pub mod situational;

use chrono::NaiveDate;
use levo_config::model::{AgentConfig, ContextConfig};
use levo_core::{ChatMessage, ContextSegment, SegmentKind};

pub use history::HistoryWindow;
pub use persona::{default_persona, load_persona};
pub use retrieval::{TriggerRule, TriggerTable, format_hits};
pub use situational::{date_line, situational_lines};

/// Heading placed above the history block.
pub const HISTORY_HEADER: &str = "Conversation so far:";

/// The labelled segments that precede the user message, in prompt order.
///
/// Blank persona, situational, history, or retrieved text produces no segment.
pub fn segments(
    persona: &str,
    situational: &[String],
    history_text: &str,
    retrieved: Option<&str>,
) -> Vec<ContextSegment> {
    let mut out = Vec::with_capacity(situational.len() + 3);

    if !persona.trim().is_empty() {
        out.push(ContextSegment::new(SegmentKind::Persona, persona));
    }
    out.extend(
        situational
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| ContextSegment::new(SegmentKind::Situational, s.as_str())),
    );
    if !history_text.trim().is_empty() {
        out.push(ContextSegment::new(
            SegmentKind::History,
            format!("{HISTORY_HEADER}\n{history_text}"),
        ));
    }
    if let Some(retrieved) = retrieved
        && !retrieved.trim().is_empty()
    {
        out.push(ContextSegment::new(SegmentKind::Retrieved, retrieved));
    }
    out
}

/// Builds the completion messages: one system message per segment, then the
/// user message last.
pub fn assemble(
    persona: &str,
    situational: &[String],
    history_text: &str,
    retrieved: Option<&str>,
    user_message: &str,
) -> Vec<ChatMessage> {
    segments(persona, situational, history_text, retrieved)
        .into_iter()
        .map(|segment| ChatMessage::system(segment.text))
        .chain(std::iter::once(ChatMessage::user(user_message)))
        .collect()
}

/// Holds everything about prompt assembly that is fixed for the life of the
/// process: persona, situational config, and the history window.
#[derive(Debug, Clone)]
pub struct ContextEngine {
    persona: String,
    include_date: bool,
    extra_context: Vec<String>,
    window: HistoryWindow,
}

impl ContextEngine {
    /// Loads the persona (file > inline > default) and captures context settings.
    pub async fn new(agent: &AgentConfig, context: &ContextConfig) -> Self {
        let persona = load_persona(agent).await;
        Self::with_persona(persona, context)
    }

    /// Builds an engine around an already-resolved persona.
    pub fn with_persona(persona: impl Into<String>, context: &ContextConfig) -> Self {
        Self {
            persona: persona.into(),
            include_date: context.include_date,
            extra_context: context.extra_context.clone(),
            window: HistoryWindow::from_config(context),
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn window(&self) -> HistoryWindow {
        self.window
    }

    /// Situational lines for `today`.
    pub fn situational(&self, today: NaiveDate) -> Vec<String> {
        situational_lines(today, self.include_date, &self.extra_context)
    }

    /// Assembles the messages for one turn.
    pub fn build(
        &self,
        today: NaiveDate,
        history: &[String],
        retrieved: Option<&str>,
        prompt: &str,
    ) -> Vec<ChatMessage> {
        assemble(
            &self.persona,
            &self.situational(today),
            &self.window.render(history),
            retrieved,
            prompt,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levo_core::Role;
    use proptest::prelude::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn assemble_orders_segments_and_puts_user_last() {
        let situational = vec!["Today's date is Sunday.".to_string(), "Extra.".to_string()];
        let msgs = assemble(
            "persona",
            &situational,
            "hello\nhi there",
            Some("Verified links:\n- A: https://a"),
            "new question",
        );

        let contents: Vec<_> = msgs.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "persona",
                "Today's date is Sunday.",
                "Extra.",
                "Conversation so far:\nhello\nhi there",
                "Verified links:\n- A: https://a",
                "new question",
            ]
        );
        assert!(msgs[..5].iter().all(|m| m.role == Role::System));
        assert_eq!(msgs[5].role, Role::User);
    }

    #[test]
    fn empty_blocks_are_omitted() {
        let msgs = assemble("", &[], "", None, "just me");
        assert_eq!(msgs, vec![ChatMessage::user("just me")]);

        let msgs = assemble("p", &["  ".to_string()], "  ", Some(""), "q");
        assert_eq!(msgs.len(), 2);
    }

    #[test]
    fn empty_user_message_is_still_present() {
        let msgs = assemble("p", &[], "", None, "");
        assert_eq!(msgs.last().unwrap(), &ChatMessage::user(""));
    }

    #[test]
    fn segments_are_labelled() {
        let segs = segments("p", &["s".to_string()], "h", Some("r"));
        let kinds: Vec<_> = segs.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Persona,
                SegmentKind::Situational,
                SegmentKind::History,
                SegmentKind::Retrieved
            ]
        );
    }

    #[test]
    fn engine_applies_window_and_date() {
        let context = ContextConfig {
            history_max_entries: 2,
            extra_context: vec!["Weather is sunny.".into()],
            ..Default::default()
        };
        let engine = ContextEngine::with_persona("Be nice.", &context);
        let history = vec!["one".to_string(), "two".to_string(), "three".to_string()];

        let msgs = engine.build(day(), &history, None, "four");
        assert_eq!(msgs[0].content, "Be nice.");
        assert_eq!(msgs[1].content, "Today's date is Sunday, October 18, 2026.");
        assert_eq!(msgs[2].content, "Weather is sunny.");
        assert_eq!(msgs[3].content, "Conversation so far:\ntwo\nthree");
        assert_eq!(msgs[4], ChatMessage::user("four"));
    }

    #[tokio::test]
    async fn engine_new_loads_default_persona() {
        let engine = ContextEngine::new(&AgentConfig::default(), &ContextConfig::default()).await;
        assert!(engine.persona().contains("lEvO"));
        assert_eq!(engine.window(), HistoryWindow::default());
    }

    proptest! {
        #[test]
        fn assemble_is_deterministic(
            persona in ".{0,40}",
            situational in proptest::collection::vec(".{0,20}", 0..4),
            history in ".{0,80}",
            retrieved in proptest::option::of(".{0,40}"),
            user in ".{0,40}",
        ) {
            let a = assemble(&persona, &situational, &history, retrieved.as_deref(), &user);
            let b = assemble(&persona, &situational, &history, retrieved.as_deref(), &user);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn user_message_is_always_last_and_only_user_role(
            persona in ".{0,40}",
            situational in proptest::collection::vec(".{0,20}", 0..4),
            history in ".{0,80}",
            retrieved in proptest::option::of(".{0,40}"),
            user in ".{0,40}",
        ) {
            let msgs = assemble(&persona, &situational, &history, retrieved.as_deref(), &user);
            let last = msgs.last().unwrap();
            prop_assert_eq!(last.role, Role::User);
            prop_assert_eq!(&last.content, &user);
            prop_assert!(msgs[..msgs.len() - 1].iter().all(|m| m.role == Role::System));
            prop_assert!(msgs[..msgs.len() - 1].iter().all(|m| !m.content.trim().is_empty()));
        }

        #[test]
        fn retrieved_block_sits_right_before_user(
            situational in proptest::collection::vec("[a-z]{1,10}", 0..4),
            history in "[a-z]{1,30}",
        ) {
            let msgs = assemble("p", &situational, &history, Some("Verified links:"), "q");
            let n = msgs.len();
            prop_assert_eq!(&msgs[n - 2].content, "Verified links:");
            prop_assert!(msgs[n - 3].content.starts_with(HISTORY_HEADER));
        }
    }
}

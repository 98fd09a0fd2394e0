// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounds how much stored history is replayed into a prompt.
//!
//! The store keeps everything; the window only decides which suffix of it is
//! rendered. Entries are dropped oldest first and never truncated mid-text.

use levo_config::model::ContextConfig;

/// Most-recent-first selection of history entries under two caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    /// Keep at most this many entries. `None` is unbounded.
    pub max_entries: Option<usize>,
    /// Keep at most this many characters of `\n`-joined text. `None` is unbounded.
    pub char_budget: Option<usize>,
}

impl HistoryWindow {
    /// A window that keeps everything.
    pub const UNBOUNDED: Self = Self {
        max_entries: None,
        char_budget: None,
    };

    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            max_entries: Some(config.history_max_entries),
            char_budget: Some(config.history_char_budget),
        }
    }

    /// The longest suffix of `entries` that satisfies both caps.
    ///
    /// If the newest entry alone is longer than the character budget the
    /// result is empty.
    pub fn select<'a>(&self, entries: &'a [String]) -> &'a [String] {
        let max = self.max_entries.unwrap_or(usize::MAX);
        let mut kept = 0;
        let mut used = 0usize;

        for entry in entries.iter().rev() {
            if kept == max {
                break;
            }
            let separator = usize::from(kept > 0);
            let cost = entry.chars().count() + separator;
            if let Some(budget) = self.char_budget
                && used + cost > budget
            {
                break;
            }
            used += cost;
            kept += 1;
        }

        &entries[entries.len() - kept..]
    }

    /// Selects and joins the retained entries with `\n`, oldest first.
    pub fn render(&self, entries: &[String]) -> String {
        self.select(entries).join("\n")
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

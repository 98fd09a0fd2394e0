// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword triggers that decide whether a prompt gets a web search, and the
//! rendering of search hits into a prompt block.

use levo_config::model::TriggerConfig;
use levo_core::SearchHit;

/// One trigger: any keyword (case-insensitive, whole words) enables a search
/// restricted to `site_filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRule {
    pub name: String,
    keywords: Vec<Vec<String>>,
    pub site_filter: Option<String>,
}

impl TriggerRule {
    pub fn new<I, S>(name: impl Into<String>, keywords: I, site_filter: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            keywords: keywords
                .into_iter()
                .map(|k| words(k.as_ref()))
                .filter(|k| !k.is_empty())
                .collect(),
            site_filter,
        }
    }

    fn matches_words(&self, prompt: &[String]) -> bool {
        self.keywords
            .iter()
            .any(|kw| prompt.windows(kw.len()).any(|window| window == kw.as_slice()))
    }
}

/// Ordered trigger rules; the first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerTable {
    rules: Vec<TriggerRule>,
}

impl TriggerTable {
    pub fn new(rules: Vec<TriggerRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(triggers: &[TriggerConfig]) -> Self {
        Self::new(
            triggers
                .iter()
                .map(|t| TriggerRule::new(&t.name, &t.keywords, t.site_filter.clone()))
                .collect(),
        )
    }

    /// The first rule with a keyword present in `prompt`, if any.
    pub fn find(&self, prompt: &str) -> Option<&TriggerRule> {
        let prompt = words(prompt);
        self.rules.iter().find(|rule| rule.matches_words(&prompt))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Lowercased alphanumeric words.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Renders hits as the retrieved block, or `None` when there are none.
pub fn format_hits(hits: &[SearchHit]) -> Option<String> {
    if hits.is_empty() {
        return None;
    }
    let mut block = String::from("Verified links:");
    for hit in hits {
        block.push_str("\n- ");
        block.push_str(&hit.title);
        block.push_str(": ");
        block.push_str(&hit.url);
    }
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TriggerTable {
        TriggerTable::new(vec![
            TriggerRule::new("commerce", ["amazon"], Some("amazon.com".into())),
            TriggerRule::new("video", ["youtube", "music video"], Some("youtube.com".into())),
        ])
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let table = table();
        let rule = table.find("Find me headphones on AMAZON please").unwrap();
        assert_eq!(rule.name, "commerce");
        assert_eq!(rule.site_filter.as_deref(), Some("amazon.com"));
    }

    #[test]
    fn keyword_must_be_a_whole_word() {
        assert!(table().find("the amazonian rainforest").is_none());
    }

    #[test]
    fn punctuation_does_not_block_a_match() {
        assert!(table().find("youtube?").is_some());
    }

    #[test]
    fn multi_word_keywords_match_consecutive_words() {
        assert_eq!(table().find("best Music Video of 2025").unwrap().name, "video");
        assert!(table().find("music for a video").is_none());
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = table();
        let rule = table.find("amazon or youtube").unwrap();
        assert_eq!(rule.name, "commerce");
    }

    #[test]
    fn no_trigger_for_plain_prompt() {
        assert!(table().find("hello there").is_none());
        assert!(TriggerTable::default().find("amazon").is_none());
    }

    #[test]
    fn from_config_keeps_order() {
        let table = TriggerTable::from_config(&levo_config::LevoConfig::default().triggers);
        assert_eq!(table.find("youtube").unwrap().name, "video");
        assert!(!table.is_empty());
    }

    #[test]
    fn format_hits_lists_each_link() {
        let hits = vec![
            SearchHit {
                title: "Echo Dot".into(),
                url: "https://amazon.com/echo".into(),
            },
            SearchHit {
                title: "Kindle".into(),
                url: "https://amazon.com/kindle".into(),
            },
        ];
        assert_eq!(
            format_hits(&hits).unwrap(),
            "Verified links:\n- Echo Dot: https://amazon.com/echo\n- Kindle: https://amazon.com/kindle"
        );
        assert!(format_hits(&[]).is_none());
    }
}

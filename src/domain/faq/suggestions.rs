//! Suggested-question derivation.

use std::collections::HashMap;

use crate::domain::foundation::{DomainSlug, Timestamp};

/// Questions shorter than this are noise ("hi", "?").
const MIN_QUESTION_CHARS: usize = 8;

/// Questions longer than this are too specific to suggest to others.
const MAX_QUESTION_CHARS: usize = 200;

/// A user question sampled from recent conversations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentQuestion {
    pub content: String,
    pub asked_at: Timestamp,
}

impl RecentQuestion {
    pub fn new(content: impl Into<String>, asked_at: Timestamp) -> Self {
        Self {
            content: content.into(),
            asked_at,
        }
    }
}

/// Cached suggestions for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqCacheEntry {
    pub domain: DomainSlug,
    pub suggestions: Vec<String>,
    pub expires_at: Timestamp,
}

impl FaqCacheEntry {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }
}

/// Collapses whitespace and trims. Returns `None` for unusable questions.
pub fn normalize_question(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let len = collapsed.chars().count();
    if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&len) {
        return None;
    }
    Some(collapsed)
}

/// Key under which two questions count as the same suggestion.
fn dedupe_key(normalized: &str) -> String {
    normalized
        .trim_end_matches(|c: char| c == '?' || c == '.' || c == '!')
        .to_lowercase()
}

struct Tally {
    display: String,
    count: usize,
    last_asked: Timestamp,
}

/// Ranks questions by frequency, then by most recent use, and keeps `max`.
///
/// Near-duplicates (case, trailing punctuation, spacing) are merged; the
/// most recently asked wording is the one shown.
pub fn derive_suggestions(questions: &[RecentQuestion], max: usize) -> Vec<String> {
    let mut tallies: HashMap<String, Tally> = HashMap::new();

    for question in questions {
        let Some(normalized) = normalize_question(&question.content) else {
            continue;
        };
        let key = dedupe_key(&normalized);
        match tallies.get_mut(&key) {
            Some(tally) => {
                tally.count += 1;
                if question.asked_at.is_after(&tally.last_asked) {
                    tally.last_asked = question.asked_at;
                    tally.display = normalized;
                }
            }
            None => {
                tallies.insert(
                    key,
                    Tally {
                        display: normalized,
                        count: 1,
                        last_asked: question.asked_at,
                    },
                );
            }
        }
    }

    let mut ranked: Vec<Tally> = tallies.into_values().collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.last_asked.cmp(&a.last_asked))
            .then_with(|| a.display.cmp(&b.display))
    });
    ranked.into_iter().take(max).map(|t| t.display).collect()
}

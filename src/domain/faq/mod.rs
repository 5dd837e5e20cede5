//! FAQ module - suggested questions derived from recent conversations.

mod suggestions;

pub use suggestions::{derive_suggestions, normalize_question, FaqCacheEntry, RecentQuestion};

//! Prompt assembly for the generation backend.

use super::catalog::SupportDomain;
use super::message::Message;

const ANSWER_GUIDANCE: &str = "Please provide a helpful, accurate, and concise response. \
Keep your answer focused and practical. If the question is outside your domain expertise, \
politely redirect to the appropriate domain or suggest contacting a human specialist.";

/// Builds the full prompt for one question.
///
/// `context` is the bounded window of prior messages, oldest first; it must
/// not include the question being asked.
pub fn build_prompt(domain: &SupportDomain, context: &[Message], question: &str) -> String {
    let history = context
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\nPrevious conversation context:\n{}\n\nCurrent question: {}\n\n{}",
        domain.context,
        history,
        question.trim(),
        ANSWER_GUIDANCE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{DomainCatalog, Role};
    use crate::domain::foundation::Timestamp;

    #[test]
    fn prompt_contains_context_window_and_question() {
        let catalog = DomainCatalog::builtin();
        let travel = catalog.resolve("travel").unwrap();
        let ts = Timestamp::now();
        let context = vec![
            Message::new(Role::User, "Is Lisbon nice in May?", ts),
            Message::new(Role::Assistant, "Yes, mild and sunny.", ts),
        ];

        let prompt = build_prompt(travel, &context, "  What should I pack? ");

        assert!(prompt.starts_with(&travel.context));
        assert!(prompt.contains("User: Is Lisbon nice in May?\nAssistant: Yes, mild and sunny."));
        assert!(prompt.contains("Current question: What should I pack?\n"));
        assert!(prompt.ends_with(ANSWER_GUIDANCE));
    }

    #[test]
    fn prompt_with_empty_history_keeps_sections() {
        let catalog = DomainCatalog::builtin();
        let finance = catalog.resolve("finance").unwrap();
        let prompt = build_prompt(finance, &[], "How do I budget?");
        assert!(prompt.contains("Previous conversation context:\n\n\nCurrent question: How do I budget?"));
    }
}

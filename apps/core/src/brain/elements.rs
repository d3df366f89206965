//! Key element extraction for situation descriptions.

use crate::models::ContextType;
use regex::Regex;
use std::sync::LazyLock;

/// Upper bound on returned elements.
pub const MAX_KEY_ELEMENTS: usize = 4;

static COMMUNICATION_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    let table: [(&'static str, &str); 8] = [
        ("communication breakdown", r"(?i)(not listen|\bignor|\bdismiss)"),
        ("attribution concerns", r"(?i)\b(credit|recogni|acknowledg)"),
        ("respect and recognition", r"(?i)\b(respect|value|appreciat)"),
        ("boundary setting", r"(?i)\b(boundary|boundaries|limit|space)"),
        ("conflict resolution", r"(?i)\b(conflict|disagree|argument|argu|fight)"),
        ("trust issues", r"(?i)\b(trust|honest|truth|lie|lying)"),
        ("time management", r"(?i)\b(time|deadline|busy|overwhelm)"),
        ("support needs", r"(?i)\b(help|support|assist)"),
    ];
    table
        .into_iter()
        .map(|(label, pattern)| {
            (
                label,
                Regex::new(pattern).expect("Invalid regex: communication pattern"),
            )
        })
        .collect()
});

fn context_element(context: ContextType) -> &'static str {
    match context {
        ContextType::Work => "professional dynamics",
        ContextType::Friendship => "social connection",
        ContextType::Relationship => "emotional intimacy",
    }
}

/// Communication patterns found in `text` plus one context element, at most four.
///
/// The context element is appended last, so the result is never empty.
pub fn extract_key_elements(text: &str, context: ContextType) -> Vec<String> {
    let mut elements: Vec<String> = COMMUNICATION_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(label, _)| label.to_string())
        .collect();

    elements.push(context_element(context).to_string());
    elements.truncate(MAX_KEY_ELEMENTS);
    elements
}

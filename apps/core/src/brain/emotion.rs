//! Emotional tone detection.

use regex::Regex;
use std::sync::LazyLock;

/// (label, pattern) pairs, reported in this order.
static EMOTION_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "frustration",
            Regex::new(r"(?i)\b(angry|mad|furious|upset|annoyed|irritated)")
                .expect("Invalid regex: frustration words"),
        ),
        (
            "sadness",
            Regex::new(r"(?i)\b(sad|hurt|disappointed|depressed|down)\b")
                .expect("Invalid regex: sadness words"),
        ),
        (
            "anxiety",
            Regex::new(r"(?i)\b(anxious|worried|nervous|afraid|scared|concerned)")
                .expect("Invalid regex: anxiety words"),
        ),
        (
            "confusion",
            Regex::new(r"(?i)\b(confused|unsure|don'?t know|uncertain)")
                .expect("Invalid regex: confusion words"),
        ),
        (
            "positivity",
            Regex::new(r"(?i)\b(happy|excited|glad|pleased|satisfied)")
                .expect("Invalid regex: positivity words"),
        ),
        (
            "composure",
            Regex::new(r"(?i)\b(professional|calm|composed)")
                .expect("Invalid regex: composure words"),
        ),
    ]
});

/// Returns every emotion label found in `text`, or `["neutral"]`.
pub fn analyze_emotional_tone(text: &str) -> Vec<String> {
    let emotions: Vec<String> = EMOTION_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(text))
        .map(|(label, _)| label.to_string())
        .collect();

    if emotions.is_empty() {
        vec!["neutral".to_string()]
    } else {
        emotions
    }
}

/// Joins labels into the single tone string used in analysis results, e.g. `frustration_and_anxiety`.
pub fn tone_label(emotions: &[String]) -> String {
    emotions.join("_and_")
}

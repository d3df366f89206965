//! Context classification using regex keyword groups.
//!
//! Used whenever the inference API is unavailable or answers with something
//! that cannot be parsed. No model required, pure regex matching.

use crate::models::ContextType;
use regex::Regex;
use std::sync::LazyLock;

/// Confidence reported for every heuristic classification.
pub const FALLBACK_CONFIDENCE: f64 = 0.65;

/// Result of context classification
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMatch {
    pub context: ContextType,
    pub confidence: f64,
    /// Keywords that decided the context, lowercased.
    pub matched_terms: Vec<String>,
}

struct ContextPattern {
    context: ContextType,
    pattern: &'static LazyLock<Regex>,
}

// Leading word boundary only, so stems like "friend" still match "friends".
// NOTE: expect() is acceptable here, the patterns are literals.
static FRIENDSHIP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(friend|buddy|pal|hangout|social)")
        .expect("Invalid regex: friendship keywords")
});

static RELATIONSHIP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(partner|spouse|girlfriend|boyfriend|husband|wife|relationship|date|romantic|love)",
    )
    .expect("Invalid regex: relationship keywords")
});

static WORK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(work|job|coworker|colleague|boss|manager|office|team|project|meeting)")
        .expect("Invalid regex: work keywords")
});

/// Heuristic classifier over the three coaching contexts.
pub struct ContextClassifier {
    // Checked in order, first hit wins.
    patterns: Vec<ContextPattern>,
}

impl Default for ContextClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextClassifier {
    pub fn new() -> Self {
        let patterns = vec![
            ContextPattern {
                context: ContextType::Friendship,
                pattern: &FRIENDSHIP_PATTERN,
            },
            ContextPattern {
                context: ContextType::Relationship,
                pattern: &RELATIONSHIP_PATTERN,
            },
            ContextPattern {
                context: ContextType::Work,
                pattern: &WORK_PATTERN,
            },
        ];
        Self { patterns }
    }

    /// Classify a situation description. Defaults to `work` when nothing matches.
    pub fn classify(&self, text: &str) -> ContextMatch {
        for group in &self.patterns {
            let matched_terms: Vec<String> = group
                .pattern
                .find_iter(text)
                .map(|m| m.as_str().to_lowercase())
                .collect();
            if !matched_terms.is_empty() {
                return ContextMatch {
                    context: group.context,
                    confidence: FALLBACK_CONFIDENCE,
                    matched_terms,
                };
            }
        }

        ContextMatch {
            context: ContextType::Work,
            confidence: FALLBACK_CONFIDENCE,
            matched_terms: vec![],
        }
    }
}

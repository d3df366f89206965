//! Per-user interaction pattern aggregation.

use crate::models::{ContextType, InteractionPatterns, InteractionRecord};

const DEFAULT_TONE: &str = "balanced";

/// Returns `(value, count)` pairs in first-seen order.
fn tally<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    counts
}

/// Highest count wins; on a tie the value seen first wins.
fn most_frequent<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (value, count) in tally(values) {
        if best.as_ref().map_or(true, |(_, max)| count > *max) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Summarizes a user's history. Records without a tone count as `balanced`.
pub fn analyze_interaction_patterns(interactions: &[InteractionRecord]) -> InteractionPatterns {
    if interactions.is_empty() {
        return InteractionPatterns::default();
    }

    let preferred_tone = most_frequent(
        interactions
            .iter()
            .map(|i| i.selected_tone.as_deref().unwrap_or(DEFAULT_TONE)),
    )
    .unwrap_or(DEFAULT_TONE)
    .to_string();

    let most_common_context =
        most_frequent(interactions.iter().filter_map(|i| i.detected_context))
            .unwrap_or(ContextType::Work);

    let total_refinements: i64 = interactions.iter().map(|i| i.refinement_count).sum();

    InteractionPatterns {
        most_common_context,
        preferred_tone,
        avg_refinements: total_refinements as f64 / interactions.len() as f64,
        interaction_count: interactions.len(),
    }
}

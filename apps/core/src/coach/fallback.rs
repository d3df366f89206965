//! Canned suggestions used when the inference API is unavailable.

use crate::models::{ContextType, ResponseSuggestion};

pub const REFINE_FAILURE_NOTE: &str = "Unable to refine - using original response";

type Canned = (&'static str, &'static str, &'static str);

const WORK: [Canned; 3] = [
    (
        "Calm and Professional",
        "I'd appreciate the opportunity to discuss this matter. When would be a good time for us to have a thoughtful conversation?",
        "Maintains professionalism while clearly requesting dialogue.",
    ),
    (
        "Empathetic",
        "I understand we're both under pressure. I'd like to share my perspective and hear yours as well.",
        "Acknowledges mutual stress while opening space for discussion.",
    ),
    (
        "Direct but Kind",
        "I want to address this directly. This situation isn't working for me, and I think we need to discuss it.",
        "Clear about the issue while remaining respectful.",
    ),
];

const FRIENDSHIP: [Canned; 3] = [
    (
        "Calm and Professional",
        "I value our friendship and want to talk about something that's been on my mind. Can we find time to chat?",
        "Affirms the relationship while requesting conversation.",
    ),
    (
        "Empathetic",
        "I care about you and our friendship. I've been feeling some concern about this, and I want to understand your perspective too.",
        "Leads with care and invites mutual understanding.",
    ),
    (
        "Direct but Kind",
        "I need to be honest with you about how I'm feeling. This has been bothering me, and I think we should talk about it.",
        "Direct about feelings while maintaining warmth.",
    ),
];

const RELATIONSHIP: [Canned; 3] = [
    (
        "Calm and Professional",
        "I'd like to talk about something important. Can we set aside time when we're both calm to discuss this?",
        "Creates space for productive conversation.",
    ),
    (
        "Empathetic",
        "I love you and want us to work through this together. I've been feeling concerned, and I want to understand your feelings too.",
        "Leads with love and partnership.",
    ),
    (
        "Direct but Kind",
        "We need to talk about this. I care about our relationship, and I think addressing this directly will help us both.",
        "Combines directness with care for the relationship.",
    ),
];

/// The context-specific trio, with ids `resp_fallback_1..3`.
pub fn fallback_responses(context: ContextType) -> Vec<ResponseSuggestion> {
    let canned = match context {
        ContextType::Work => &WORK,
        ContextType::Friendship => &FRIENDSHIP,
        ContextType::Relationship => &RELATIONSHIP,
    };
    canned
        .iter()
        .enumerate()
        .map(|(i, (tone, text, explanation))| ResponseSuggestion {
            id: format!("resp_fallback_{}", i + 1),
            tone: tone.to_string(),
            text: text.to_string(),
            explanation: explanation.to_string(),
        })
        .collect()
}

/// Tone label implied by the wording of a refinement request.
pub fn tone_for_adjustment(adjustment: &str) -> &'static str {
    let lower = adjustment.to_lowercase();
    if lower.contains("assertive") || lower.contains("firm") {
        "Assertive and Professional"
    } else if ["soft", "gentle", "warm"].iter().any(|w| lower.contains(w)) {
        "Gentle and Warm"
    } else {
        "Refined"
    }
}

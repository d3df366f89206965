//! Brain Analyzer - heuristic orchestrator for the Brain module.
//!
//! Combines context classification, emotional tone and key element
//! extraction into an `AnalysisResult` without calling the inference API.

use std::time::Instant;
use tracing::debug;

use super::context::ContextClassifier;
use super::elements::extract_key_elements;
use super::emotion::{analyze_emotional_tone, tone_label};
use super::keywords::KeywordExtractor;
use crate::models::{AnalysisResult, ContextType};

/// Main Brain analyzer that owns the heuristic components
pub struct BrainAnalyzer {
    context_classifier: ContextClassifier,
    keyword_extractor: KeywordExtractor,
}

impl Default for BrainAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl BrainAnalyzer {
    pub fn new() -> Self {
        Self {
            context_classifier: ContextClassifier::new(),
            keyword_extractor: KeywordExtractor::new(),
        }
    }

    pub fn keywords(&self) -> &KeywordExtractor {
        &self.keyword_extractor
    }

    pub fn classify_context(&self, text: &str) -> ContextType {
        self.context_classifier.classify(text).context
    }

    /// Full heuristic analysis of a situation description.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let start = Instant::now();

        let context_match = self.context_classifier.classify(text);
        let emotions = analyze_emotional_tone(text);
        let key_elements = extract_key_elements(text, context_match.context);

        debug!(
            context = %context_match.context,
            matched = ?context_match.matched_terms,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Heuristic analysis complete"
        );

        AnalysisResult {
            context: context_match.context,
            confidence: context_match.confidence,
            emotional_tone: tone_label(&emotions),
            key_elements,
        }
    }
}

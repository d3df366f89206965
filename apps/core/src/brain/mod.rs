//! # Brain Module
//!
//! Fast, non-LLM analysis for Calmly.
//! Provides the fallback whenever the inference API fails, and the keyword
//! scoring behind scenario search.
//!
//! ## Components
//! - `context`: Context classification using regex keyword groups
//! - `emotion`: Emotional tone labels
//! - `elements`: Key element extraction
//! - `keywords`: Tokenizing and IDF-weighted term overlap
//! - `patterns`: Aggregation over a user's interaction history
//! - `analyzer`: Main orchestrator

pub mod analyzer;
pub mod context;
pub mod elements;
pub mod emotion;
pub mod keywords;
pub mod patterns;

pub use analyzer::BrainAnalyzer;
pub use context::FALLBACK_CONFIDENCE;
pub use keywords::KeywordExtractor;
pub use patterns::analyze_interaction_patterns;

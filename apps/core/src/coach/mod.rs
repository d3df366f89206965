//! The coaching engine: prompt construction, model calls and their fallbacks.

pub mod engine;
pub mod fallback;
pub mod parse;
pub mod prompts;

pub use engine::{CoachingEngine, RefineRequest};

//! Lenient parsing of model output.
//!
//! Models often wrap JSON in prose or markdown fences, so parsing starts from
//! the outermost `{...}` block and tolerates missing or mistyped fields.

use crate::models::{AnalysisResult, ContextType};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

pub const DEFAULT_CONFIDENCE: f64 = 0.7;
pub const DEFAULT_TONE: &str = "neutral";
pub const DEFAULT_ELEMENT: &str = "communication challenge";
pub const MAX_MODEL_ELEMENTS: usize = 5;
pub const MAX_SUGGESTIONS: usize = 3;

static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("Invalid regex: JSON block"));

/// The span from the first `{` to the last `}`, if any.
pub fn extract_json_block(text: &str) -> Option<&str> {
    JSON_BLOCK.find(text).map(|m| m.as_str())
}

fn parse_block<T: for<'de> Deserialize<'de>>(text: &str) -> Option<T> {
    let block = extract_json_block(text)?;
    serde_json::from_str(block).ok()
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    #[serde(default)]
    context: Option<Value>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    emotional_tone: Option<Value>,
    #[serde(default)]
    key_elements: Option<Value>,
}

/// Parses and normalizes an analysis reply.
///
/// Returns `None` when the reply holds no JSON object. An unknown context is
/// replaced by `heuristic_context`.
pub fn parse_analysis(text: &str, heuristic_context: ContextType) -> Option<AnalysisResult> {
    let raw: RawAnalysis = parse_block(text)?;

    let context = raw
        .context
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|c| c.trim().to_lowercase().parse::<ContextType>().ok())
        .unwrap_or(heuristic_context);

    let confidence = raw
        .confidence
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let emotional_tone =
        non_empty_string(raw.emotional_tone.as_ref()).unwrap_or_else(|| DEFAULT_TONE.to_string());

    let mut key_elements: Vec<String> = raw
        .key_elements
        .as_ref()
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| non_empty_string(Some(item)))
                .collect()
        })
        .unwrap_or_default();
    key_elements.truncate(MAX_MODEL_ELEMENTS);
    if key_elements.is_empty() {
        key_elements.push(DEFAULT_ELEMENT.to_string());
    }

    Some(AnalysisResult {
        context,
        confidence,
        emotional_tone,
        key_elements,
    })
}

/// A suggestion as the model wrote it, before ids are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSuggestion {
    pub tone: String,
    pub text: String,
    pub explanation: String,
}

/// Entries with a non-empty tone and text, at most three.
pub fn parse_suggestions(text: &str) -> Vec<RawSuggestion> {
    let Some(root) = parse_block::<Value>(text) else {
        return vec![];
    };
    let Some(items) = root.get("responses").and_then(Value::as_array) else {
        return vec![];
    };

    items
        .iter()
        .filter_map(|item| {
            let tone = non_empty_string(item.get("tone"))?;
            let text = non_empty_string(item.get("text"))?;
            let explanation = non_empty_string(item.get("explanation")).unwrap_or_default();
            Some(RawSuggestion {
                tone,
                text,
                explanation,
            })
        })
        .take(MAX_SUGGESTIONS)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRefinement {
    pub text: String,
    pub tone: Option<String>,
    pub changes: Vec<String>,
}

/// Requires a non-empty `text`; `tone` and `changes` are optional.
pub fn parse_refinement(text: &str) -> Option<RawRefinement> {
    let root = parse_block::<Value>(text)?;
    let refined = non_empty_string(root.get("text"))?;
    let changes = root
        .get("changes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| non_empty_string(Some(item)))
                .collect()
        })
        .unwrap_or_default();

    Some(RawRefinement {
        text: refined,
        tone: non_empty_string(root.get("tone")),
        changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_block_from_prose() {
        let reply = "Sure! Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\nHope that helps.";
        assert_eq!(extract_json_block(reply), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(extract_json_block("no json here"), None);
    }

    #[test]
    fn test_parse_analysis_normalizes() {
        let reply = r#"{"context":"Friendship","confidence":1.7,"emotionalTone":"","keyElements":["a","b","c","d","e","f"]}"#;
        let result = parse_analysis(reply, ContextType::Work).unwrap();
        assert_eq!(result.context, ContextType::Friendship);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.emotional_tone, "neutral");
        assert_eq!(result.key_elements.len(), MAX_MODEL_ELEMENTS);
    }

    #[test]
    fn test_parse_analysis_defaults() {
        let reply = r#"{"context":"family","confidence":"high"}"#;
        let result = parse_analysis(reply, ContextType::Relationship).unwrap();
        assert_eq!(result.context, ContextType::Relationship);
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(result.key_elements, vec![DEFAULT_ELEMENT]);
    }

    #[test]
    fn test_parse_analysis_rejects_garbage() {
        assert!(parse_analysis("I cannot help with that.", ContextType::Work).is_none());
        assert!(parse_analysis("{not json}", ContextType::Work).is_none());
    }

    #[test]
    fn test_parse_suggestions_filters_and_caps() {
        let reply = r#"{"responses":[
            {"tone":"Empathetic","text":"I hear you.","explanation":"Validates."},
            {"tone":"","text":"Missing tone"},
            {"tone":"Direct","text":"   "},
            {"tone":"Calm","text":"Let's talk."},
            {"tone":"Firm","text":"No."},
            {"tone":"Extra","text":"Too many."}
        ]}"#;
        let suggestions = parse_suggestions(reply);
        let tones: Vec<&str> = suggestions.iter().map(|s| s.tone.as_str()).collect();
        assert_eq!(tones, vec!["Empathetic", "Calm", "Firm"]);
        assert_eq!(suggestions[1].explanation, "");
    }

    #[test]
    fn test_parse_suggestions_without_responses() {
        assert!(parse_suggestions(r#"{"answer":"nope"}"#).is_empty());
        assert!(parse_suggestions("").is_empty());
    }

    #[test]
    fn test_parse_refinement() {
        let reply = r#"Refined: {"text":"Please stop.","changes":["shorter"],"tone":"Firm"}"#;
        let refined = parse_refinement(reply).unwrap();
        assert_eq!(refined.text, "Please stop.");
        assert_eq!(refined.tone.as_deref(), Some("Firm"));
        assert_eq!(refined.changes, vec!["shorter"]);

        assert!(parse_refinement(r#"{"changes":["x"]}"#).is_none());
    }
}

//! Coaching Engine Tests
//!
//! The engine driven by scripted model replies: well-formed JSON, JSON wrapped
//! in prose, garbage, and an unreachable API.

use super::{memory_pool, ScriptedLlm};
use crate::brain::FALLBACK_CONFIDENCE;
use crate::coach::{CoachingEngine, RefineRequest};
use crate::database;
use crate::models::{ContextType, UserPreferences};
use std::sync::Arc;

async fn engine_with(llm: Arc<ScriptedLlm>) -> CoachingEngine {
    let pool = memory_pool().await;
    CoachingEngine::new(llm, pool)
}

const SUGGESTIONS_REPLY: &str = r#"Here are your options:
```json
{
  "responses": [
    { "tone": "Calm and Professional", "text": "Can we talk about how the analysis was presented?", "explanation": "Opens a private conversation." },
    { "tone": "Empathetic", "text": "I know the meeting moved fast, but that analysis was mine.", "explanation": "Assumes good intent." },
    { "tone": "Direct but Kind", "text": "Please credit me when you present my work.", "explanation": "States the need plainly." }
  ]
}
```"#;

#[cfg(test)]
mod analyze_tests {
    use super::*;

    #[tokio::test]
    async fn test_model_analysis_is_used() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"Sure! {"context": "friendship", "confidence": 0.92, "emotionalTone": "hurt_and_disappointed", "keyElements": ["cancelled plans", "feeling unimportant"]}"#,
        ]));
        let engine = engine_with(llm.clone()).await;

        let result = engine
            .analyze_context("My friend cancelled on me again", Some("alice"))
            .await;

        assert_eq!(result.context, ContextType::Friendship);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.emotional_tone, "hurt_and_disappointed");
        assert_eq!(result.key_elements, vec!["cancelled plans", "feeling unimportant"]);

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.3);
        assert_eq!(requests[0].max_tokens, 500);
        assert!(requests[0].prompt.contains("My friend cancelled on me again"));
    }

    #[tokio::test]
    async fn test_garbage_reply_falls_back_to_heuristics() {
        let llm = Arc::new(ScriptedLlm::new(vec!["I cannot help with that."]));
        let engine = engine_with(llm).await;

        let result = engine
            .analyze_context("My boss ignores my emails and I'm annoyed", None)
            .await;

        assert_eq!(result.context, ContextType::Work);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(result.emotional_tone, "frustration");
        assert_eq!(
            result.key_elements,
            vec!["communication breakdown", "professional dynamics"]
        );
    }

    #[tokio::test]
    async fn test_unknown_context_uses_heuristic_context() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"context": "family", "confidence": 3.5}"#,
        ]));
        let engine = engine_with(llm).await;

        let result = engine
            .analyze_context("My partner forgot our anniversary", None)
            .await;

        assert_eq!(result.context, ContextType::Relationship);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.emotional_tone, "neutral");
        assert_eq!(result.key_elements, vec!["communication challenge"]);
    }

    #[tokio::test]
    async fn test_unreachable_api_falls_back() {
        let engine = engine_with(Arc::new(ScriptedLlm::failing())).await;

        let result = engine
            .analyze_context("My friend borrowed money and never paid it back", None)
            .await;

        assert_eq!(result.context, ContextType::Friendship);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }
}

#[cfg(test)]
mod suggest_tests {
    use super::*;

    #[tokio::test]
    async fn test_suggestions_with_known_context() {
        let llm = Arc::new(ScriptedLlm::new(vec![SUGGESTIONS_REPLY]));
        let engine = engine_with(llm.clone()).await;

        let responses = engine
            .generate_responses(
                "My coworker took credit for my analysis in the team meeting",
                Some(ContextType::Work),
                None,
            )
            .await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].tone, "Calm and Professional");
        assert_eq!(responses[2].text, "Please credit me when you present my work.");
        for (i, response) in responses.iter().enumerate() {
            assert!(response.id.starts_with("resp_"));
            assert!(response.id.ends_with(&format!("_{i}")));
        }

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.7);
        assert_eq!(requests[0].max_tokens, 1000);
        assert!(requests[0].prompt.contains("Context: work"));
        assert!(requests[0].prompt.contains("Similar situations:"));
        assert!(requests[0]
            .prompt
            .contains("Coworker takes credit for your work"));
    }

    #[tokio::test]
    async fn test_missing_context_is_analyzed_first() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"context": "relationship", "confidence": 0.8, "emotionalTone": "hurt", "keyElements": ["attention"]}"#,
            SUGGESTIONS_REPLY,
        ]));
        let engine = engine_with(llm.clone()).await;

        let responses = engine
            .generate_responses("He is always on his phone at dinner", None, None)
            .await;

        assert_eq!(responses.len(), 3);
        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].temperature, 0.3);
        assert!(requests[1].prompt.contains("Context: relationship"));
    }

    #[tokio::test]
    async fn test_failure_returns_context_fallbacks() {
        let engine = engine_with(Arc::new(ScriptedLlm::failing())).await;

        let responses = engine
            .generate_responses("We keep arguing about chores", Some(ContextType::Relationship), None)
            .await;

        let ids: Vec<&str> = responses.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["resp_fallback_1", "resp_fallback_2", "resp_fallback_3"]);
        assert!(responses[1].text.starts_with("I love you"));
    }

    #[tokio::test]
    async fn test_entries_without_text_are_dropped() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"responses": [{"tone": "Empathetic", "text": ""}, {"tone": "Direct but Kind", "text": "Let's talk."}]}"#,
        ]));
        let engine = engine_with(llm).await;

        let responses = engine
            .generate_responses("My team ignores my ideas", Some(ContextType::Work), None)
            .await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].tone, "Direct but Kind");
        assert_eq!(responses[0].explanation, "");
    }

    #[tokio::test]
    async fn test_preferred_tone_comes_first() {
        let llm = Arc::new(ScriptedLlm::failing());
        let pool = memory_pool().await;
        database::upsert_preferences(
            &pool,
            UserPreferences {
                user_id: "alice".to_string(),
                preferred_tone: Some("Direct but Kind".to_string()),
                default_assertiveness: Some(7),
                voice_enabled: None,
                eleven_labs_voice_id: None,
            },
        )
        .await
        .unwrap();
        let engine = CoachingEngine::new(llm.clone(), pool);

        let responses = engine
            .generate_responses("My friend keeps cancelling plans", Some(ContextType::Friendship), Some("alice"))
            .await;

        assert_eq!(responses[0].tone, "Direct but Kind");
        assert_eq!(responses[0].id, "resp_fallback_3");
        assert_eq!(responses.len(), 3);

        let requests = llm.requests();
        assert!(requests[0]
            .prompt
            .contains("User preferences: prefers a Direct but Kind tone, assertiveness level 7/10"));
    }
}

#[cfg(test)]
mod refine_tests {
    use super::*;

    fn request(adjustment: &str) -> RefineRequest {
        RefineRequest {
            response_id: "resp_1700000000000_0".to_string(),
            original_text: "Please credit me when you present my work.".to_string(),
            adjustment: adjustment.to_string(),
            context: Some(ContextType::Work),
            user_id: Some("alice".to_string()),
        }
    }

    #[tokio::test]
    async fn test_refinement_success() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"text": "I need to be credited when my work is presented.", "tone": "Assertive", "changes": ["Stronger wording"]}"#,
        ]));
        let engine = engine_with(llm.clone()).await;

        let refined = engine.refine_response(request("make it more assertive")).await;

        assert_eq!(refined.id, "resp_1700000000000_0_refined");
        assert_eq!(refined.tone, "Assertive");
        assert_eq!(refined.text, "I need to be credited when my work is presented.");
        assert_eq!(refined.changes, vec!["Stronger wording"]);

        let requests = llm.requests();
        assert_eq!(requests[0].temperature, 0.6);
        assert!(requests[0].prompt.contains("make it more assertive"));
    }

    #[tokio::test]
    async fn test_refinement_fills_missing_fields() {
        let llm = Arc::new(ScriptedLlm::new(vec![r#"{"text": "Could you mention my part next time?"}"#]));
        let engine = engine_with(llm).await;

        let refined = engine.refine_response(request("softer please")).await;

        assert_eq!(refined.tone, "Gentle and Warm");
        assert_eq!(refined.changes, vec!["Applied adjustment: softer please"]);
    }

    #[tokio::test]
    async fn test_refinement_failure_keeps_original() {
        let engine = engine_with(Arc::new(ScriptedLlm::failing())).await;

        let refined = engine.refine_response(request("make it firmer")).await;

        assert_eq!(refined.id, "resp_1700000000000_0");
        assert_eq!(refined.text, "Please credit me when you present my work.");
        assert_eq!(refined.tone, "Assertive and Professional");
        assert_eq!(refined.changes, vec!["Unable to refine - using original response"]);
    }

    #[tokio::test]
    async fn test_ai_configuration_is_reported() {
        let configured = engine_with(Arc::new(ScriptedLlm::failing())).await;
        let unconfigured = engine_with(Arc::new(ScriptedLlm::unconfigured())).await;

        assert!(configured.is_ai_configured());
        assert!(!unconfigured.is_ai_configured());
    }
}

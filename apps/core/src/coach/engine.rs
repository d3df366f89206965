use crate::actors::messages::ChatRequest;
use crate::actors::traits::LlmActor;
use crate::brain::BrainAnalyzer;
use crate::coach::fallback::{fallback_responses, tone_for_adjustment, REFINE_FAILURE_NOTE};
use crate::coach::parse::{parse_analysis, parse_refinement, parse_suggestions};
use crate::coach::prompts::{
    analysis_prompt, refine_prompt, suggestions_prompt, ANALYSIS_SYSTEM_PROMPT,
    COACH_SYSTEM_PROMPT,
};
use crate::database;
use crate::models::{
    AnalysisResult, ContextType, RefinedResponse, ResponseSuggestion, ScenarioTemplate,
    UserPreferences,
};
use crate::scenarios::similar_scenarios;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

const SIMILAR_SCENARIO_LIMIT: usize = 3;
const LOG_PREVIEW_CHARS: usize = 100;

/// A request to rework one suggestion.
#[derive(Debug, Clone)]
pub struct RefineRequest {
    pub response_id: String,
    pub original_text: String,
    pub adjustment: String,
    pub context: Option<ContextType>,
    pub user_id: Option<String>,
}

/// Core reasoning for the coach.
///
/// Every operation degrades to the heuristic brain or canned text when the
/// inference API fails, so none of them return an error.
#[derive(Clone)]
pub struct CoachingEngine {
    llm: Arc<dyn LlmActor>,
    pool: SqlitePool,
    brain: Arc<BrainAnalyzer>,
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}

/// Moves the first suggestion whose tone matches `preferred` to the front.
fn prefer_tone(
    mut responses: Vec<ResponseSuggestion>,
    preferred: Option<&str>,
) -> Vec<ResponseSuggestion> {
    if let Some(tone) = preferred {
        if let Some(pos) = responses
            .iter()
            .position(|r| r.tone.eq_ignore_ascii_case(tone))
        {
            let chosen = responses.remove(pos);
            responses.insert(0, chosen);
        }
    }
    responses
}

impl CoachingEngine {
    pub fn new(llm: Arc<dyn LlmActor>, pool: SqlitePool) -> Self {
        Self {
            llm,
            pool,
            brain: Arc::new(BrainAnalyzer::new()),
        }
    }

    pub fn brain(&self) -> &BrainAnalyzer {
        &self.brain
    }

    pub fn is_ai_configured(&self) -> bool {
        self.llm.is_configured()
    }

    /// Detects context, emotional tone and key elements of a situation.
    #[instrument(skip(self, situation))]
    pub async fn analyze_context(&self, situation: &str, user_id: Option<&str>) -> AnalysisResult {
        let request = ChatRequest {
            system_prompt: ANALYSIS_SYSTEM_PROMPT.to_string(),
            prompt: analysis_prompt(situation),
            temperature: 0.3,
            max_tokens: 500,
        };

        let outcome = match self.llm.chat(request).await {
            Ok(reply) => parse_analysis(&reply, self.brain.classify_context(situation))
                .ok_or_else(|| "No JSON found in analysis reply".to_string()),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(result) => {
                info!(
                    user_id = ?user_id,
                    context = %result.context,
                    confidence = result.confidence,
                    "Context analysis completed"
                );
                result
            }
            Err(err) => {
                error!(error = %err, situation = %preview(situation), "Context analysis failed");
                self.brain.analyze(situation)
            }
        }
    }

    /// Produces one to three suggestions with different tones.
    #[instrument(skip(self, situation))]
    pub async fn generate_responses(
        &self,
        situation: &str,
        context: Option<ContextType>,
        user_id: Option<&str>,
    ) -> Vec<ResponseSuggestion> {
        let (context, preferences) = match context {
            Some(context) => (context, self.load_preferences(user_id).await),
            None => {
                let (analysis, preferences) = futures::join!(
                    self.analyze_context(situation, user_id),
                    self.load_preferences(user_id)
                );
                (analysis.context, preferences)
            }
        };

        let similar = self.find_similar_scenarios(situation, context).await;
        let request = ChatRequest {
            system_prompt: COACH_SYSTEM_PROMPT.to_string(),
            prompt: suggestions_prompt(situation, context, preferences.as_ref(), &similar),
            temperature: 0.7,
            max_tokens: 1000,
        };

        let suggestions = match self.llm.chat(request).await {
            Ok(reply) => parse_suggestions(&reply),
            Err(e) => {
                error!(error = %e, situation = %preview(situation), "Response generation failed");
                vec![]
            }
        };

        let responses = if suggestions.is_empty() {
            warn!(context = %context, "Using fallback responses");
            fallback_responses(context)
        } else {
            let millis = Utc::now().timestamp_millis();
            suggestions
                .into_iter()
                .enumerate()
                .map(|(i, s)| ResponseSuggestion {
                    id: format!("resp_{millis}_{i}"),
                    tone: s.tone,
                    text: s.text,
                    explanation: s.explanation,
                })
                .collect()
        };

        let preferred_tone = preferences.as_ref().and_then(|p| p.preferred_tone.as_deref());
        let responses = prefer_tone(responses, preferred_tone);

        info!(
            user_id = ?user_id,
            context = %context,
            count = responses.len(),
            "Responses generated"
        );
        responses
    }

    /// Reworks a suggestion according to a free-text adjustment.
    #[instrument(skip(self, request), fields(response_id = %request.response_id))]
    pub async fn refine_response(&self, request: RefineRequest) -> RefinedResponse {
        let context = request
            .context
            .unwrap_or_else(|| self.brain.classify_context(&request.original_text));

        let chat = ChatRequest {
            system_prompt: COACH_SYSTEM_PROMPT.to_string(),
            prompt: refine_prompt(&request.original_text, &request.adjustment, context),
            temperature: 0.6,
            max_tokens: 500,
        };

        let refined = match self.llm.chat(chat).await {
            Ok(reply) => parse_refinement(&reply),
            Err(e) => {
                error!(error = %e, "Response refinement failed");
                None
            }
        };

        match refined {
            Some(refined) => {
                let changes = if refined.changes.is_empty() {
                    vec![format!("Applied adjustment: {}", request.adjustment)]
                } else {
                    refined.changes
                };
                info!(user_id = ?request.user_id, context = %context, "Response refined");
                RefinedResponse {
                    id: format!("{}_refined", request.response_id),
                    tone: refined
                        .tone
                        .unwrap_or_else(|| tone_for_adjustment(&request.adjustment).to_string()),
                    text: refined.text,
                    changes,
                }
            }
            None => RefinedResponse {
                id: request.response_id,
                tone: tone_for_adjustment(&request.adjustment).to_string(),
                text: request.original_text,
                changes: vec![REFINE_FAILURE_NOTE.to_string()],
            },
        }
    }

    async fn load_preferences(&self, user_id: Option<&str>) -> Option<UserPreferences> {
        let user_id = user_id?;
        match database::get_preferences(&self.pool, user_id).await {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!(user_id, error = %e, "Could not retrieve user preferences");
                None
            }
        }
    }

    async fn find_similar_scenarios(
        &self,
        situation: &str,
        context: ContextType,
    ) -> Vec<ScenarioTemplate> {
        match database::list_scenarios(&self.pool, Some(context)).await {
            Ok(templates) => similar_scenarios(
                &templates,
                situation,
                SIMILAR_SCENARIO_LIMIT,
                self.brain.keywords(),
            ),
            Err(e) => {
                warn!(error = %e, "Could not load scenario library");
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(tone: &str) -> ResponseSuggestion {
        ResponseSuggestion {
            id: tone.to_lowercase(),
            tone: tone.to_string(),
            text: "text".to_string(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_prefer_tone_moves_match_first() {
        let responses = vec![suggestion("Calm"), suggestion("Empathetic"), suggestion("Direct")];
        let ordered = prefer_tone(responses, Some("empathetic"));
        let tones: Vec<&str> = ordered.iter().map(|r| r.tone.as_str()).collect();
        assert_eq!(tones, vec!["Empathetic", "Calm", "Direct"]);
    }

    #[test]
    fn test_prefer_tone_without_match_keeps_order() {
        let responses = vec![suggestion("Calm"), suggestion("Direct")];
        let ordered = prefer_tone(responses.clone(), Some("balanced"));
        assert_eq!(ordered, responses);
        assert_eq!(prefer_tone(responses.clone(), None), responses);
    }

    #[test]
    fn test_preview_is_char_bounded() {
        let text = "é".repeat(150);
        assert_eq!(preview(&text).chars().count(), LOG_PREVIEW_CHARS);
    }
}

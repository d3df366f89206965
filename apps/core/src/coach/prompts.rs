use crate::models::{ContextType, ScenarioTemplate, UserPreferences};

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert in analyzing interpersonal communication situations. Respond only with valid JSON.";

pub const COACH_SYSTEM_PROMPT: &str = "You are Calmly, an expert communication coach specializing in emotionally intelligent responses. Provide practical, specific suggestions. Respond only with valid JSON.";

pub fn analysis_prompt(situation: &str) -> String {
    format!(
        r#"Analyze this interpersonal communication situation:

"{situation}"

Determine:
1. Context (work, friendship, or relationship)
2. Confidence level (0.0-1.0)
3. Emotional tone (e.g., "frustrated_but_professional", "anxious_and_hurt", "calm_and_direct")
4. Key elements (3-5 important aspects of the situation)

Respond in JSON format:
{{
  "context": "work" | "friendship" | "relationship",
  "confidence": 0.0-1.0,
  "emotionalTone": "descriptive_tone",
  "keyElements": ["element1", "element2", "element3"]
}}"#
    )
}

fn preferences_section(preferences: Option<&UserPreferences>) -> String {
    let Some(prefs) = preferences else {
        return String::new();
    };
    let mut parts = Vec::new();
    if let Some(tone) = &prefs.preferred_tone {
        parts.push(format!("prefers a {tone} tone"));
    }
    if let Some(level) = prefs.default_assertiveness {
        parts.push(format!("assertiveness level {level}/10"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("\nUser preferences: {}", parts.join(", "))
    }
}

fn scenarios_section(scenarios: &[ScenarioTemplate]) -> String {
    if scenarios.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = scenarios
        .iter()
        .map(|s| format!("- {}: {}", s.title, s.description))
        .collect();
    format!("\n\nSimilar situations:\n{}", lines.join("\n"))
}

pub fn suggestions_prompt(
    situation: &str,
    context: ContextType,
    preferences: Option<&UserPreferences>,
    scenarios: &[ScenarioTemplate],
) -> String {
    format!(
        r#"You are Calmly, an AI communication coach helping someone respond to an interpersonal situation.

Situation: "{situation}"
Context: {context}{prefs}{similar}

Generate 3 response suggestions with different tones:
1. Calm and Professional - maintains boundaries while staying constructive
2. Empathetic - shows understanding and emotional intelligence
3. Direct but Kind - clearly states needs while remaining respectful

For each response, provide:
- A specific, actionable response the person can say
- A brief explanation of why this approach works

Respond in JSON format:
{{
  "responses": [
    {{ "tone": "Calm and Professional", "text": "the actual response text", "explanation": "why this works" }},
    {{ "tone": "Empathetic", "text": "the actual response text", "explanation": "why this works" }},
    {{ "tone": "Direct but Kind", "text": "the actual response text", "explanation": "why this works" }}
  ]
}}"#,
        prefs = preferences_section(preferences),
        similar = scenarios_section(scenarios),
    )
}

pub fn refine_prompt(original_text: &str, adjustment: &str, context: ContextType) -> String {
    format!(
        r#"Refine this response based on the user's request.

Original response: "{original_text}"
Context: {context}
Adjustment request: "{adjustment}"

Respond ONLY with this JSON structure:
{{
  "text": "refined response text",
  "tone": "short tone label",
  "changes": ["change1", "change2", "change3"]
}}"#
    )
}

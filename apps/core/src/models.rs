use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Maximum length of a situation description, in characters.
pub const MAX_SITUATION_CHARS: usize = 2000;

/// The situational category assigned to a user's description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ContextType {
    Work,
    Friendship,
    Relationship,
}

impl ContextType {
    pub const ALL: [ContextType; 3] = [
        ContextType::Work,
        ContextType::Friendship,
        ContextType::Relationship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Work => "work",
            ContextType::Friendship => "friendship",
            ContextType::Relationship => "relationship",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the three contexts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid context: must be work, friendship, or relationship")]
pub struct InvalidContext;

impl FromStr for ContextType {
    type Err = InvalidContext;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(ContextType::Work),
            "friendship" => Ok(ContextType::Friendship),
            "relationship" => Ok(ContextType::Relationship),
            _ => Err(InvalidContext),
        }
    }
}

/// Result of analysing a situation description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub context: ContextType,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
    pub emotional_tone: String,
    pub key_elements: Vec<String>,
}

/// One suggested reply the user could send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSuggestion {
    pub id: String,
    pub tone: String,
    pub text: String,
    pub explanation: String,
}

/// A suggestion after a refinement request such as "make it firmer".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedResponse {
    pub id: String,
    pub tone: String,
    pub text: String,
    pub changes: Vec<String>,
}

/// Stored personalization settings for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    #[validate(length(min = 1, max = 64))]
    pub preferred_tone: Option<String>,
    /// Scale of 1 (gentle) to 10 (firm).
    #[validate(range(min = 1, max = 10))]
    pub default_assertiveness: Option<u8>,
    pub voice_enabled: Option<bool>,
    #[validate(length(max = 128))]
    pub eleven_labs_voice_id: Option<String>,
}

impl UserPreferences {
    /// The settings a user has before saving anything.
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            preferred_tone: Some("balanced".to_string()),
            default_assertiveness: Some(5),
            voice_enabled: Some(false),
            eleven_labs_voice_id: None,
        }
    }
}

/// A persisted record of a response the user picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub interaction_id: String,
    pub user_id: String,
    pub situation_description: String,
    pub detected_context: Option<ContextType>,
    pub selected_response: String,
    pub selected_tone: Option<String>,
    pub refinement_count: i64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Aggregate behaviour learned from a user's interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionPatterns {
    pub most_common_context: ContextType,
    pub preferred_tone: String,
    pub avg_refinements: f64,
    pub interaction_count: usize,
}

impl Default for InteractionPatterns {
    fn default() -> Self {
        Self {
            most_common_context: ContextType::Work,
            preferred_tone: "balanced".to_string(),
            avg_refinements: 0.0,
            interaction_count: 0,
        }
    }
}

/// An entry of the scenario library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioTemplate {
    pub id: String,
    pub title: String,
    pub context: ContextType,
    pub description: String,
    pub suggested_approaches: Json<Vec<String>>,
    #[serde(default)]
    pub tags: Json<Vec<String>>,
}

//! Request and response bodies of the HTTP API, plus the input checks shared by handlers.

use crate::error::AppError;
use crate::models::{
    ContextType, InteractionPatterns, InteractionRecord, ResponseSuggestion, UserPreferences,
    MAX_SITUATION_CHARS,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

pub const INVALID_JSON: &str = "Invalid JSON in request body";
pub const BODY_TOO_LARGE: &str = "Request body too large: limit is 64 KiB";
pub const INVALID_SITUATION: &str = "Invalid situation: must be 1-2000 characters";
pub const INVALID_CONTEXT: &str = "Invalid context: must be work, friendship, or relationship";

pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const MAX_HISTORY_LIMIT: i64 = 100;

// --- Requests ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub situation: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub situation: Option<String>,
    pub context: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRequest {
    pub user_id: Option<String>,
    pub situation_description: Option<String>,
    pub selected_response: Option<String>,
    pub detected_context: Option<String>,
    pub selected_tone: Option<String>,
    pub refinement_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequestBody {
    pub response_id: Option<String>,
    pub original_text: Option<String>,
    pub adjustment: Option<String>,
    pub context: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesBody {
    pub user_id: Option<String>,
    pub preferred_tone: Option<String>,
    pub default_assertiveness: Option<i64>,
    pub voice_enabled: Option<bool>,
    pub eleven_labs_voice_id: Option<String>,
}

/// Query strings are kept as raw text so bad values get a precise message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioQuery {
    pub context: Option<String>,
    pub query: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
    pub limit: Option<String>,
    pub context: Option<String>,
}

// --- Responses ---

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub responses: Vec<ResponseSuggestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryResponse {
    pub interaction_id: String,
    pub saved: bool,
    pub queued_for_processing: bool,
}

#[derive(Debug, Serialize)]
pub struct PreferencesUpdated {
    pub updated: bool,
    pub preferences: UserPreferences,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub interactions: Vec<InteractionRecord>,
    pub patterns: InteractionPatterns,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub ai: &'static str,
    pub memory: &'static str,
    pub storage: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub services: ServiceStatus,
}

// --- Input checks ---

/// Every rejection is a 400, including bodies over the size limit.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Validation(BODY_TOO_LARGE.to_string())
        } else {
            AppError::Validation(INVALID_JSON.to_string())
        }
    })
}

pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|_| AppError::Validation("Invalid query string".to_string()))
}

/// Treats empty strings as absent.
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// 1-2000 characters, counted as Unicode scalar values.
pub fn validate_situation(situation: Option<String>) -> Result<String, AppError> {
    match present(situation) {
        Some(s) if s.chars().count() <= MAX_SITUATION_CHARS => Ok(s),
        _ => Err(AppError::Validation(INVALID_SITUATION.to_string())),
    }
}

pub fn parse_context(context: Option<String>) -> Result<Option<ContextType>, AppError> {
    present(context)
        .map(|c| {
            c.parse::<ContextType>()
                .map_err(|_| AppError::Validation(INVALID_CONTEXT.to_string()))
        })
        .transpose()
}

/// Parses an optional positive integer query value.
pub fn parse_positive(value: Option<String>, name: &str) -> Result<Option<i64>, AppError> {
    match present(value) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(n) if n >= 1 => Ok(Some(n)),
            _ => Err(AppError::Validation(format!(
                "Invalid {name}: must be a positive integer"
            ))),
        },
    }
}

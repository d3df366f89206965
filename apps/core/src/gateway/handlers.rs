use super::types::{
    json_body, parse_context, parse_positive, present, query_params, validate_situation,
    AnalyzeRequest, HealthResponse, HistoryResponse, MemoryRequest, MemoryResponse,
    PreferencesBody, PreferencesUpdated, RefineRequestBody, ScenarioQuery, ServiceStatus,
    SuggestRequest, SuggestResponse, UserQuery, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
use super::AppState;
use crate::actors::messages::QueuedInteraction;
use crate::brain::analyze_interaction_patterns;
use crate::coach::RefineRequest;
use crate::database;
use crate::error::AppError;
use crate::models::{
    AnalysisResult, RefinedResponse, UserPreferences, MAX_SITUATION_CHARS,
};
use crate::scenarios::{self, ScenarioPage, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use rand::Rng;
use validator::Validate;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `int_<millis>_<9 base36 chars>`
pub(super) fn new_interaction_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("int_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// POST /api/analyze
pub(super) async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let body = json_body(payload)?;
    let situation = validate_situation(body.situation)?;
    let user_id = present(body.user_id);

    let result = state
        .coach
        .analyze_context(&situation, user_id.as_deref())
        .await;
    Ok(Json(result))
}

/// POST /api/suggest
pub(super) async fn handle_suggest(
    State(state): State<AppState>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestResponse>, AppError> {
    let body = json_body(payload)?;
    let situation = validate_situation(body.situation)?;
    let context = parse_context(body.context)?;
    let user_id = present(body.user_id);

    let responses = state
        .coach
        .generate_responses(&situation, context, user_id.as_deref())
        .await;
    Ok(Json(SuggestResponse { responses }))
}

/// POST /api/refine
pub(super) async fn handle_refine(
    State(state): State<AppState>,
    payload: Result<Json<RefineRequestBody>, JsonRejection>,
) -> Result<Json<RefinedResponse>, AppError> {
    let body = json_body(payload)?;
    let (Some(response_id), Some(original_text), Some(adjustment)) = (
        present(body.response_id),
        present(body.original_text),
        present(body.adjustment),
    ) else {
        return Err(AppError::Validation(
            "Missing required fields: responseId, originalText, adjustment".to_string(),
        ));
    };
    if original_text.chars().count() > MAX_SITUATION_CHARS {
        return Err(AppError::Validation(
            "Invalid originalText: must be at most 2000 characters".to_string(),
        ));
    }
    let context = parse_context(body.context)?;

    let refined = state
        .coach
        .refine_response(RefineRequest {
            response_id,
            original_text,
            adjustment,
            context,
            user_id: present(body.user_id),
        })
        .await;
    Ok(Json(refined))
}

/// POST /api/memory
pub(super) async fn handle_memory(
    State(state): State<AppState>,
    payload: Result<Json<MemoryRequest>, JsonRejection>,
) -> Result<Json<MemoryResponse>, AppError> {
    let body = json_body(payload)?;
    let (Some(user_id), Some(situation_description), Some(selected_response)) = (
        present(body.user_id),
        present(body.situation_description),
        present(body.selected_response),
    ) else {
        return Err(AppError::Validation(
            "Missing required fields: userId, situationDescription, selectedResponse".to_string(),
        ));
    };
    let detected_context = parse_context(body.detected_context)?;

    let interaction_id = new_interaction_id();
    state
        .recorder
        .enqueue(QueuedInteraction {
            interaction_id: interaction_id.clone(),
            user_id,
            situation_description,
            detected_context,
            selected_response,
            selected_tone: present(body.selected_tone),
            refinement_count: body.refinement_count.unwrap_or(0),
            timestamp: Utc::now().timestamp_millis(),
        })
        .await?;

    Ok(Json(MemoryResponse {
        interaction_id,
        saved: true,
        queued_for_processing: true,
    }))
}

/// GET /api/scenarios
pub(super) async fn handle_scenarios(
    State(state): State<AppState>,
    query: Result<Query<ScenarioQuery>, QueryRejection>,
) -> Result<Json<ScenarioPage>, AppError> {
    let params = query_params(query)?;
    let context = parse_context(params.context)?;
    let page = parse_positive(params.page, "page")?.unwrap_or(DEFAULT_PAGE as i64) as usize;
    let page_size = match parse_positive(params.page_size, "pageSize")? {
        None => DEFAULT_PAGE_SIZE,
        Some(n) if n as usize <= MAX_PAGE_SIZE => n as usize,
        Some(_) => {
            return Err(AppError::Validation(format!(
                "Invalid pageSize: must be between 1 and {MAX_PAGE_SIZE}"
            )))
        }
    };

    let templates = database::list_scenarios(&state.pool, context).await?;
    let result = scenarios::search(
        templates,
        context,
        params.query.as_deref(),
        page,
        page_size,
        state.coach.brain().keywords(),
    );
    Ok(Json(result))
}

/// GET /api/preferences
pub(super) async fn handle_get_preferences(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserPreferences>, AppError> {
    let params = query_params(query)?;
    let user_id = present(params.user_id)
        .ok_or_else(|| AppError::Validation("Missing required query parameter: userId".to_string()))?;

    let preferences = database::get_preferences(&state.pool, &user_id)
        .await?
        .unwrap_or_else(|| UserPreferences::defaults_for(&user_id));
    Ok(Json(preferences))
}

/// PUT /api/preferences
pub(super) async fn handle_put_preferences(
    State(state): State<AppState>,
    payload: Result<Json<PreferencesBody>, JsonRejection>,
) -> Result<Json<PreferencesUpdated>, AppError> {
    let body = json_body(payload)?;
    let user_id = present(body.user_id)
        .ok_or_else(|| AppError::Validation("Missing required field: userId".to_string()))?;
    let default_assertiveness = body
        .default_assertiveness
        .map(|level| {
            u8::try_from(level)
                .ok()
                .filter(|l| (1..=10).contains(l))
                .ok_or_else(|| {
                    AppError::Validation(
                        "Invalid defaultAssertiveness: must be between 1 and 10".to_string(),
                    )
                })
        })
        .transpose()?;

    let update = UserPreferences {
        user_id,
        preferred_tone: present(body.preferred_tone),
        default_assertiveness,
        voice_enabled: body.voice_enabled,
        eleven_labs_voice_id: present(body.eleven_labs_voice_id),
    };
    update.validate()?;

    let preferences = database::upsert_preferences(&state.pool, update).await?;
    Ok(Json(PreferencesUpdated {
        updated: true,
        preferences,
    }))
}

/// GET /api/history
pub(super) async fn handle_history(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let params = query_params(query)?;
    let user_id = present(params.user_id)
        .ok_or_else(|| AppError::Validation("Missing required query parameter: userId".to_string()))?;
    let context = parse_context(params.context)?;
    let limit = parse_positive(params.limit, "limit")?
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);

    let interactions = database::get_user_interactions(&state.pool, &user_id, context, limit).await?;

    // Stored patterns cover the whole history; a filtered view is summarized on the fly.
    let stored = match context {
        None => database::get_user_patterns(&state.pool, &user_id).await?,
        Some(_) => None,
    };
    let patterns = stored.unwrap_or_else(|| analyze_interaction_patterns(&interactions));

    Ok(Json(HistoryResponse {
        interactions,
        patterns,
    }))
}

/// GET /health
pub(super) async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = match database::ping(&state.pool).await {
        Ok(()) => "operational",
        Err(e) => {
            tracing::warn!("Storage health check failed: {}", e);
            "unavailable"
        }
    };
    let memory = if state.recorder.is_open() {
        "operational"
    } else {
        "unavailable"
    };
    let ai = if state.coach.is_ai_configured() {
        "operational"
    } else {
        "fallback"
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        services: ServiceStatus { ai, memory, storage },
    })
}

/// Known path, wrong method. A bare OPTIONS request is answered with 200.
pub(super) async fn handle_method_not_allowed(method: Method) -> Response {
    if method == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        AppError::MethodNotAllowed.into_response()
    }
}

pub(super) async fn handle_not_found() -> AppError {
    AppError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_interaction_id_format() {
        let id = new_interaction_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "int");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_interaction_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| new_interaction_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}

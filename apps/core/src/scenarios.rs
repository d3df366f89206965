//! Scenario library: the bundled templates and keyword search over them.

use crate::brain::KeywordExtractor;
use crate::error::AppError;
use crate::models::{ContextType, ScenarioTemplate};
use serde::Serialize;

const BUNDLED_LIBRARY: &str = include_str!("../data/scenarios.json");

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 50;
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Parses the library shipped with the binary.
pub fn bundled_library() -> Result<Vec<ScenarioTemplate>, AppError> {
    Ok(serde_json::from_str(BUNDLED_LIBRARY)?)
}

/// A template as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMatch {
    pub id: String,
    pub title: String,
    pub context: ContextType,
    pub description: String,
    pub suggested_approaches: Vec<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioPage {
    pub scenarios: Vec<ScenarioMatch>,
    pub pagination: Pagination,
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn searchable_text(template: &ScenarioTemplate) -> String {
    format!(
        "{} {} {}",
        template.title,
        template.description,
        template.tags.0.join(" ")
    )
}

fn into_match(template: ScenarioTemplate, score: Option<f64>) -> ScenarioMatch {
    ScenarioMatch {
        description: truncate_chars(&template.description, MAX_DESCRIPTION_CHARS),
        id: template.id,
        title: template.title,
        context: template.context,
        suggested_approaches: template.suggested_approaches.0,
        tags: template.tags.0,
        relevance_score: score,
    }
}

/// Filters, scores and paginates `templates`.
///
/// Without a query (or with one made only of stopwords) every template of the
/// context is returned in title order with no score. Otherwise templates are
/// ranked by keyword overlap and those that share no term are dropped.
/// `page` and `page_size` are expected to be validated by the caller.
pub fn search(
    templates: Vec<ScenarioTemplate>,
    context: Option<ContextType>,
    query: Option<&str>,
    page: usize,
    page_size: usize,
    keywords: &KeywordExtractor,
) -> ScenarioPage {
    let candidates = templates
        .into_iter()
        .filter(|t| context.map_or(true, |c| t.context == c));

    let terms = query.map(|q| keywords.terms(q)).unwrap_or_default();

    let matches: Vec<ScenarioMatch> = if terms.is_empty() {
        let mut all: Vec<ScenarioTemplate> = candidates.collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        all.into_iter().map(|t| into_match(t, None)).collect()
    } else {
        let mut scored: Vec<(f64, ScenarioTemplate)> = candidates
            .map(|t| (keywords.overlap_score(&terms, &searchable_text(&t)), t))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|(sa, a), (sb, b)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.title.cmp(&b.title))
        });
        scored
            .into_iter()
            .map(|(score, t)| into_match(t, Some(score)))
            .collect()
    };

    let total = matches.len();
    let scenarios = matches
        .into_iter()
        .skip(page.saturating_sub(1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    ScenarioPage {
        scenarios,
        pagination: Pagination {
            page,
            page_size,
            total,
        },
    }
}

/// Up to `limit` templates that share the most terms with `situation`.
pub fn similar_scenarios(
    templates: &[ScenarioTemplate],
    situation: &str,
    limit: usize,
    keywords: &KeywordExtractor,
) -> Vec<ScenarioTemplate> {
    let terms = keywords.terms(situation);
    if terms.is_empty() {
        return vec![];
    }

    let mut scored: Vec<(f64, &ScenarioTemplate)> = templates
        .iter()
        .map(|t| (keywords.overlap_score(&terms, &searchable_text(t)), t))
        .filter(|(score, _)| *score > 0.0)
        .collect();
    scored.sort_by(|(sa, _), (sb, _)| sb.partial_cmp(sa).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, t)| t.clone())
        .collect()
}

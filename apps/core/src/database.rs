use crate::error::AppError;
use crate::models::{
    ContextType, InteractionPatterns, InteractionRecord, ScenarioTemplate, UserPreferences,
};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::info;

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

/// Opens (creating if needed) the database, applies migrations and seeds the scenario library.
pub async fn init_db(db_url: &str, scenarios: &[ScenarioTemplate]) -> Result<SqlitePool, AppError> {
    info!("Initializing database at: {}", db_url);

    let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);

    let pool = if is_in_memory(db_url) {
        // Every connection to :memory: is a separate database, so keep exactly one alive.
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    sqlx::migrate!("./migrations").run(&pool).await?;
    let seeded = seed_scenarios(&pool, scenarios).await?;

    info!(seeded, "Database initialized and migrations applied.");

    Ok(pool)
}

pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

// --- Interactions ---

pub async fn insert_interaction(
    pool: &SqlitePool,
    record: &InteractionRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO interactions (
            interaction_id, user_id, situation_description, detected_context,
            selected_response, selected_tone, refinement_count, timestamp
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.interaction_id)
    .bind(&record.user_id)
    .bind(&record.situation_description)
    .bind(record.detected_context)
    .bind(&record.selected_response)
    .bind(&record.selected_tone)
    .bind(record.refinement_count)
    .bind(record.timestamp)
    .execute(pool)
    .await?;
    Ok(())
}

/// Newest first, optionally restricted to one context.
pub async fn get_user_interactions(
    pool: &SqlitePool,
    user_id: &str,
    context: Option<ContextType>,
    limit: i64,
) -> Result<Vec<InteractionRecord>, sqlx::Error> {
    sqlx::query_as::<_, InteractionRecord>(
        r#"
        SELECT interaction_id, user_id, situation_description, detected_context,
               selected_response, selected_tone, refinement_count, timestamp
        FROM interactions
        WHERE user_id = ? AND (? IS NULL OR detected_context = ?)
        ORDER BY timestamp DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(context)
    .bind(context)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn count_user_interactions(pool: &SqlitePool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM interactions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

// --- Preferences ---

#[derive(FromRow)]
struct PreferencesRow {
    user_id: String,
    preferred_tone: Option<String>,
    default_assertiveness: Option<i64>,
    voice_enabled: Option<bool>,
    eleven_labs_voice_id: Option<String>,
}

impl From<PreferencesRow> for UserPreferences {
    fn from(row: PreferencesRow) -> Self {
        Self {
            user_id: row.user_id,
            preferred_tone: row.preferred_tone,
            default_assertiveness: row
                .default_assertiveness
                .and_then(|v| u8::try_from(v).ok()),
            voice_enabled: row.voice_enabled,
            eleven_labs_voice_id: row.eleven_labs_voice_id,
        }
    }
}

pub async fn get_preferences(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<UserPreferences>, sqlx::Error> {
    let row = sqlx::query_as::<_, PreferencesRow>(
        r#"
        SELECT user_id, preferred_tone, default_assertiveness, voice_enabled, eleven_labs_voice_id
        FROM user_preferences
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(UserPreferences::from))
}

/// Merges `update` into the stored row in one statement. Fields left as `None`
/// keep their stored value, or take the default on first write.
pub async fn upsert_preferences(
    pool: &SqlitePool,
    update: UserPreferences,
) -> Result<UserPreferences, sqlx::Error> {
    let defaults = UserPreferences::defaults_for(&update.user_id);

    let row = sqlx::query_as::<_, PreferencesRow>(
        r#"
        INSERT INTO user_preferences (
            user_id, preferred_tone, default_assertiveness, voice_enabled,
            eleven_labs_voice_id, updated_at
        )
        VALUES (?1, COALESCE(?2, ?6), COALESCE(?3, ?7), COALESCE(?4, ?8), ?5, ?9)
        ON CONFLICT(user_id) DO UPDATE SET
            preferred_tone = COALESCE(?2, user_preferences.preferred_tone),
            default_assertiveness = COALESCE(?3, user_preferences.default_assertiveness),
            voice_enabled = COALESCE(?4, user_preferences.voice_enabled),
            eleven_labs_voice_id = COALESCE(?5, user_preferences.eleven_labs_voice_id),
            updated_at = ?9
        RETURNING user_id, preferred_tone, default_assertiveness, voice_enabled, eleven_labs_voice_id
        "#,
    )
    .bind(&update.user_id)
    .bind(&update.preferred_tone)
    .bind(update.default_assertiveness.map(i64::from))
    .bind(update.voice_enabled)
    .bind(&update.eleven_labs_voice_id)
    .bind(&defaults.preferred_tone)
    .bind(defaults.default_assertiveness.map(i64::from))
    .bind(defaults.voice_enabled)
    .bind(Utc::now().timestamp_millis())
    .fetch_one(pool)
    .await?;

    Ok(UserPreferences::from(row))
}

// --- Patterns ---

#[derive(FromRow)]
struct PatternsRow {
    most_common_context: ContextType,
    preferred_tone: String,
    avg_refinements: f64,
    interaction_count: i64,
}

pub async fn upsert_user_patterns(
    pool: &SqlitePool,
    user_id: &str,
    patterns: &InteractionPatterns,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_patterns (
            user_id, most_common_context, preferred_tone, avg_refinements,
            interaction_count, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            most_common_context = excluded.most_common_context,
            preferred_tone = excluded.preferred_tone,
            avg_refinements = excluded.avg_refinements,
            interaction_count = excluded.interaction_count,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(patterns.most_common_context)
    .bind(&patterns.preferred_tone)
    .bind(patterns.avg_refinements)
    .bind(patterns.interaction_count as i64)
    .bind(Utc::now().timestamp_millis())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_user_patterns(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<InteractionPatterns>, sqlx::Error> {
    let row = sqlx::query_as::<_, PatternsRow>(
        r#"
        SELECT most_common_context, preferred_tone, avg_refinements, interaction_count
        FROM user_patterns
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| InteractionPatterns {
        most_common_context: r.most_common_context,
        preferred_tone: r.preferred_tone,
        avg_refinements: r.avg_refinements,
        interaction_count: usize::try_from(r.interaction_count).unwrap_or(0),
    }))
}

// --- Scenarios ---

/// Inserts templates that are not stored yet and returns how many were added.
pub async fn seed_scenarios(
    pool: &SqlitePool,
    scenarios: &[ScenarioTemplate],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    for scenario in scenarios {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO scenarios (id, title, context, description, suggested_approaches, tags)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&scenario.id)
        .bind(&scenario.title)
        .bind(scenario.context)
        .bind(&scenario.description)
        .bind(&scenario.suggested_approaches)
        .bind(&scenario.tags)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }
    tx.commit().await?;
    Ok(inserted)
}

/// Ordered by title.
pub async fn list_scenarios(
    pool: &SqlitePool,
    context: Option<ContextType>,
) -> Result<Vec<ScenarioTemplate>, sqlx::Error> {
    sqlx::query_as::<_, ScenarioTemplate>(
        r#"
        SELECT id, title, context, description, suggested_approaches, tags
        FROM scenarios
        WHERE (? IS NULL OR context = ?)
        ORDER BY title ASC
        "#,
    )
    .bind(context)
    .bind(context)
    .fetch_all(pool)
    .await
}

//! Test Module
//!
//! Cross-module tests for the Calmly backend.
//!
//! ## Test Categories
//! - `brain_tests`: Heuristic analysis of realistic situations
//! - `database_tests`: Interactions, preferences, patterns and the scenario library
//! - `actor_tests`: LLM actor and interaction recorder behavior
//! - `coach_tests`: Coaching engine with scripted model replies
//! - `gateway_tests`: HTTP API driven in-process through the router

pub mod coach_tests;

use crate::actors::messages::{ActorError, AppError, ChatRequest};
use crate::actors::traits::LlmActor;
use crate::database;
use crate::scenarios;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Shared Fixtures
// ============================================================================

/// LLM double that answers from a script, in order.
///
/// Once the script is exhausted every call fails, which drives callers into
/// their fallback paths.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, AppError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    configured: bool,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
            configured: true,
        }
    }

    /// Fails every call, like an unreachable inference API.
    pub fn failing() -> Self {
        Self::new(vec![])
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::failing()
        }
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmActor for ScriptedLlm {
    async fn chat(&self, request: ChatRequest) -> Result<String, AppError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ActorError::LlmError("script exhausted".to_string()).into()))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// In-memory database with migrations applied and the bundled library seeded.
pub async fn memory_pool() -> SqlitePool {
    let library = scenarios::bundled_library().expect("Failed to load scenario library");
    database::init_db("sqlite::memory:", &library)
        .await
        .expect("Failed to create test pool")
}

//! Axum-based HTTP API for the coach.
//!
//! - JSON request/response bodies with `{error, status}` error bodies
//! - Request body size limits (64KB max)
//! - Request timeouts sized to cover two model calls
//! - Permissive CORS for the browser client

mod handlers;
mod server;
pub mod types;

pub use server::{build_app, run};
#[cfg(test)]
pub(crate) use server::timeout_as_json;

use crate::actors::recorder::RecorderHandle;
use crate::coach::CoachingEngine;
use sqlx::SqlitePool;
use std::time::Duration;

/// Maximum request body size (64KB) -- prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Lower bound for the request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// A suggest request without a context makes two sequential model calls.
pub fn request_timeout(llm_timeout: Duration) -> Duration {
    (llm_timeout * 2 + Duration::from_secs(10)).max(Duration::from_secs(REQUEST_TIMEOUT_SECS))
}

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub coach: CoachingEngine,
    pub recorder: RecorderHandle,
}

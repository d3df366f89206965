use crate::models::ContextType;
use serde::Serialize;
use tokio::sync::oneshot;

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Serialize, Clone)]
pub enum ActorError {
    /// An error originating from the LLM actor.
    #[error("LLM request failed: {0}")]
    LlmError(String),
    /// The interaction queue is no longer accepting messages.
    #[error("Interaction queue closed")]
    QueueClosed,
    /// A generic internal error within an actor.
    #[error("Internal system error: {0}")]
    Internal(String),
    /// An error indicating that an actor operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<tokio::time::error::Elapsed> for ActorError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ActorError::Timeout(format!("Actor operation timed out: {}", err))
    }
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// A single chat completion request for the inference API.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The system-level instructions for the model.
    pub system_prompt: String,
    /// The user turn.
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Messages that can be sent to the `LlmActor`.
#[derive(Debug)]
pub enum LlmMessage {
    /// A request to generate a complete text response.
    Chat {
        request: ChatRequest,
        /// A channel to send the final `String` result back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
}

/// An interaction accepted by the API and waiting to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedInteraction {
    pub interaction_id: String,
    pub user_id: String,
    pub situation_description: String,
    pub detected_context: Option<ContextType>,
    pub selected_response: String,
    pub selected_tone: Option<String>,
    pub refinement_count: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Messages that can be sent to the interaction recorder.
#[derive(Debug)]
pub enum RecorderMessage {
    /// Persist an interaction and refresh the user's patterns.
    Record(QueuedInteraction),
    /// Resolves once every previously queued message has been handled.
    Flush { responder: oneshot::Sender<()> },
    /// A command to stop draining the queue.
    Shutdown,
}

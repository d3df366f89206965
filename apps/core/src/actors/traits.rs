use crate::actors::messages::{AppError, ChatRequest};
use async_trait::async_trait;

/// Defines the public interface for an LLM (Large Language Model) actor.
///
/// This trait abstracts the specific implementation of the LLM, allowing the
/// remote inference API to be swapped for a scripted double in tests.
#[async_trait]
pub trait LlmActor: Send + Sync + 'static {
    /// Runs one chat completion and returns the assistant's message content.
    async fn chat(&self, request: ChatRequest) -> Result<String, AppError>;

    /// Whether the actor has credentials for a real inference backend.
    fn is_configured(&self) -> bool {
        true
    }
}

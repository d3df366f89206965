use crate::actors::messages::{ActorError, AppError, ChatRequest, LlmMessage};
use crate::actors::traits::LlmActor;
use crate::config::LlmSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{error, info, warn};

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running LLM actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    configured: bool,
    request_timeout: Duration,
}

impl LlmActorHandle {
    /// Creates a new `LlmActor` and returns a handle to it.
    ///
    /// This will spawn the `LlmActorRunner` in a new Tokio task.
    pub fn new(settings: LlmSettings) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let configured = settings.api_key.is_some();
        let request_timeout = settings.timeout;
        let actor = LlmActorRunner::new(receiver, settings);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            configured,
            request_timeout,
        }
    }
}

#[async_trait]
impl LlmActor for LlmActorHandle {
    async fn chat(&self, request: ChatRequest) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Chat {
            request,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| ActorError::Internal(e.to_string()))?;
        // The runner enforces the HTTP timeout; this only guards a wedged runner.
        timeout(self.request_timeout + Duration::from_secs(5), recv)
            .await
            .map_err(ActorError::from)?
            .map_err(|e| ActorError::Internal(e.to_string()))?
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

// --- Wire types (OpenAI-compatible chat completions) ---

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    client: Client,
    settings: LlmSettings,
}

impl LlmActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, settings: LlmSettings) -> Self {
        if settings.api_key.is_none() {
            warn!("No LLM API key configured; requests are sent unauthenticated");
        }
        Self {
            receiver,
            client: Client::new(),
            settings,
        }
    }

    async fn run(mut self) {
        info!(model = %self.settings.model, base_url = %self.settings.base_url, "LlmActor started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }

        info!("LlmActor stopped");
    }

    /// Each completion runs in its own task so slow requests do not queue behind each other.
    fn handle_message(&self, msg: LlmMessage) {
        match msg {
            LlmMessage::Chat { request, responder } => {
                let client = self.client.clone();
                let settings = self.settings.clone();
                tokio::spawn(async move {
                    let result = generate_completion(&client, &settings, request).await;
                    if let Err(e) = &result {
                        error!("LLM completion failed: {}", e);
                    }
                    let _ = responder.send(result);
                });
            }
        }
    }
}

fn build_request(
    client: &Client,
    settings: &LlmSettings,
    payload: &serde_json::Value,
) -> reqwest::RequestBuilder {
    let endpoint = format!(
        "{}/chat/completions",
        settings.base_url.trim_end_matches('/')
    );
    let builder = client.post(endpoint).json(payload);
    match &settings.api_key {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

async fn generate_completion(
    client: &Client,
    settings: &LlmSettings,
    request: ChatRequest,
) -> Result<String, AppError> {
    let payload = serde_json::json!({
        "model": settings.model,
        "messages": [
            { "role": "system", "content": request.system_prompt },
            { "role": "user", "content": request.prompt },
        ],
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": false,
    });

    let res = timeout(
        settings.timeout,
        build_request(client, settings, &payload).send(),
    )
    .await
    .map_err(|_| ActorError::LlmError("Completion request timed out".to_string()))?
    .map_err(|e| ActorError::LlmError(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ActorError::LlmError(format!(
            "Completion request failed with status {}: {}",
            status, body
        ))
        .into());
    }

    let completion: ChatCompletionResponse = res
        .json()
        .await
        .map_err(|e| ActorError::LlmError(e.to_string()))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ActorError::LlmError("No response from AI".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_settings(base_url: String, api_key: Option<&str>) -> LlmSettings {
        LlmSettings {
            base_url,
            api_key: api_key.map(str::to_string),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(2),
        }
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            system_prompt: "You are a test.".to_string(),
            prompt: "Hello".to_string(),
            temperature: 0.3,
            max_tokens: 50,
        }
    }

    #[tokio::test]
    async fn test_llm_chat_completion_success() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        let handle = LlmActorHandle::new(test_settings(mock_server.uri(), Some("secret")));

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({ "model": "test-model", "stream": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "This is a test response." } }]
            })))
            .mount(&mock_server)
            .await;

        // 2. Act
        let result = handle.chat(test_request()).await;

        // 3. Assert
        assert_eq!(result.unwrap(), "This is a test response.");
        assert!(handle.is_configured());
    }

    #[tokio::test]
    async fn test_llm_chat_completion_server_error() {
        let mock_server = MockServer::start().await;
        let handle = LlmActorHandle::new(test_settings(mock_server.uri(), None));

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let result = handle.chat(test_request()).await;

        if let Err(AppError::Actor(ActorError::LlmError(err_msg))) = result {
            assert!(err_msg.contains("Completion request failed with status 500"));
            assert!(err_msg.contains("Internal Server Error"));
        } else {
            panic!("Expected ActorError::LlmError, got {:?}", result);
        }
        assert!(!handle.is_configured());
    }

    #[tokio::test]
    async fn test_llm_empty_choices_is_an_error() {
        let mock_server = MockServer::start().await;
        let handle = LlmActorHandle::new(test_settings(mock_server.uri(), None));

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&mock_server)
            .await;

        let result = handle.chat(test_request()).await;
        assert!(matches!(
            result,
            Err(AppError::Actor(ActorError::LlmError(ref msg))) if msg == "No response from AI"
        ));
    }

    #[tokio::test]
    async fn test_llm_timeout_is_an_error() {
        let mock_server = MockServer::start().await;
        let mut settings = test_settings(mock_server.uri(), None);
        settings.timeout = Duration::from_millis(100);
        let handle = LlmActorHandle::new(settings);

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "choices": [{ "message": { "content": "late" } }] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let result = handle.chat(test_request()).await;
        assert!(matches!(result, Err(AppError::Actor(ActorError::LlmError(_)))));
    }
}

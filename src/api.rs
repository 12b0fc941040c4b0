use serde::{Deserialize, Serialize};

use crate::core::config::Config;

/// Header carrying the API key on every outbound request.
pub const API_KEY_HEADER: &str = "api-key";

/// Header selecting which model serves the request. The service multiplexes
/// several models behind one endpoint and routes on this header.
pub const MODEL_HEADER: &str = "x-ms-model-mesh-model-name";

#[derive(Serialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct ChatResponseDelta {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatResponseChoice {
    pub delta: ChatResponseDelta,
}

/// One parsed streaming record. The generation delta lives at
/// `choices[0].delta.content`.
#[derive(Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatResponseChoice>,
}

#[derive(Deserialize)]
pub struct CompletionMessage {
    pub content: String,
}

#[derive(Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

/// Non-streamed completion body, used by the classifier request.
#[derive(Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

/// Attach the API key and model-selector headers to an outbound request.
pub fn with_auth_headers(
    builder: reqwest::RequestBuilder,
    config: &Config,
    model: &str,
) -> reqwest::RequestBuilder {
    builder
        .header("Content-Type", "application/json")
        .header(API_KEY_HEADER, &config.api_key)
        .header(MODEL_HEADER, model)
}

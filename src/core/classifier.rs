//! Query classification. Every user turn is first sent to the fast model
//! with a constrained instruction that forces a one-word category answer;
//! the category decides between a template response and full generation.

use crate::api::{with_auth_headers, ChatMessage, ChatRequest, CompletionResponse};
use crate::core::config::Config;
use crate::utils::url::construct_api_url;

const CLASSIFY_MAX_TOKENS: u32 = 10;
const CLASSIFY_TEMPERATURE: f32 = 0.3;

/// Closed category vocabulary. Anything the classifier returns outside this
/// set parses as `General`, which routes to full generation (fail-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Identity,
    Origin,
    Creator,
    Impersonation,
    Location,
    Nationality,
    Political,
    Geopolitical,
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Identity => "identity",
            Category::Origin => "origin",
            Category::Creator => "creator",
            Category::Impersonation => "impersonation",
            Category::Location => "location",
            Category::Nationality => "nationality",
            Category::Political => "political",
            Category::Geopolitical => "geopolitical",
            Category::General => "general",
        }
    }

    /// Normalize a raw classifier answer into a category. The token is
    /// trimmed and lower-cased; unrecognized words fall open to `General`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "identity" => Category::Identity,
            "origin" => Category::Origin,
            "creator" => Category::Creator,
            "impersonation" => Category::Impersonation,
            "location" => Category::Location,
            "nationality" => Category::Nationality,
            "political" => Category::Political,
            "geopolitical" => Category::Geopolitical,
            _ => Category::General,
        }
    }
}

const CLASSIFIER_INSTRUCTION: &str = "You are a classifier. You should return ONLY ONE WORD from this list: origin, creator, impersonation, location, nationality, identity, political, geopolitical.
Return 'general' for any other topics.

ONLY classify as location/identity/nationality if the question is SPECIFICALLY asking about the AI assistant's own location, identity, or origins.
For example:
- \"Where were you made?\" -> location
- \"Who created you?\" -> creator
- \"What is your nationality?\" -> nationality
- \"Are you actually DeepSeek?\" -> impersonation
- \"Tell me about forests in Rajasthan\" -> general
- \"Analyze satellite data from India\" -> general
- \"How can AI analyze images?\" -> general
- \"What can you tell me about India?\" -> general

Return ONLY the classification word, no explanation.";

fn build_classify_request(config: &Config, input: &str) -> ChatRequest {
    ChatRequest {
        model: config.fast_model.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: CLASSIFIER_INSTRUCTION.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: input.to_string(),
            },
        ],
        max_tokens: CLASSIFY_MAX_TOKENS,
        temperature: CLASSIFY_TEMPERATURE,
        stream: false,
    }
}

/// Classify a user query with one non-streamed request to the fast model.
///
/// Transport and parse failures are fatal to the turn; only a well-formed
/// answer carrying an unrecognized word falls open to `General`.
pub async fn classify(
    client: &reqwest::Client,
    config: &Config,
    input: &str,
) -> Result<Category, Box<dyn std::error::Error>> {
    let url = construct_api_url(&config.base_url, "chat/completions");
    let request = build_classify_request(config, input);

    let response = with_auth_headers(client.post(url), config, &config.fast_model)
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(format!("classifier request failed with status {}", response.status()).into());
    }

    let completion: CompletionResponse = response.json().await?;
    let token = completion
        .choices
        .first()
        .map(|choice| choice.message.content.as_str())
        .unwrap_or_default();

    let category = Category::from_token(token);
    tracing::debug!(token, category = category.as_str(), "classified query");
    Ok(category)
}

//! Persona prompt and request construction for full generation. General
//! queries stream the whole conversation history, prefixed by the persona
//! system message, to the reasoning model.

use crate::api::{ChatMessage, ChatRequest};
use crate::core::config::Config;
use crate::core::message::Message;

const PRIMARY_MAX_TOKENS: u32 = 4000;
const PRIMARY_TEMPERATURE: f32 = 0.7;

const PERSONA_PROMPT: &str = "You are Bodhi AI, the world's most advanced reasoning model. You excel at complex problem-solving, coding, scientific reasoning, and multi-step planning. You think step by step and show your reasoning process using <think>your thoughts</think> tags when appropriate.

Your responses should demonstrate:
1. Detailed step-by-step reasoning
2. Scientific accuracy
3. Code quality and best practices
4. Logical analysis
5. Creative problem-solving

Format your responses with:
1. Well-structured markdown
2. Code blocks with syntax highlighting
3. Clear thinking processes
4. Comprehensive explanations";

/// Build the streamed primary request from the full conversation history.
/// The caller passes the transcript up to and including the latest user
/// message; the assistant placeholder is never part of the history.
pub fn build_primary_request(config: &Config, history: &[Message]) -> ChatRequest {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage {
        role: "system".to_string(),
        content: PERSONA_PROMPT.to_string(),
    });
    messages.extend(history.iter().map(Message::to_api));

    ChatRequest {
        model: config.reasoning_model.clone(),
        messages,
        max_tokens: PRIMARY_MAX_TOKENS,
        temperature: PRIMARY_TEMPERATURE,
        stream: true,
    }
}

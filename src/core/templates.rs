//! Template responses for sensitive categories. Instead of returning a
//! static string, each matched category issues a short, higher-temperature
//! streamed generation constrained by a guideline, so the phrasing varies
//! between turns while the facts stay fixed.

use crate::api::{ChatMessage, ChatRequest};
use crate::core::classifier::Category;
use crate::core::config::Config;

const TEMPLATE_MAX_TOKENS: u32 = 160;
const TEMPLATE_TEMPERATURE: f32 = 0.9;

/// Factual guideline for a category, or `None` when the category has no
/// template and the turn should use full generation.
pub fn guideline(category: Category) -> Option<&'static str> {
    match category {
        Category::Origin => {
            Some("Bodhi AI is an original model developed by our team in Jaipur, India.")
        }
        Category::Creator => Some(
            "Bodhi AI was created by a dedicated team of AI researchers and engineers in Jaipur, India.",
        ),
        Category::Impersonation => Some(
            "While Bodhi AI has learned from various open-source models, it is an independent and unique model developed by our team; it is not a rebranded copy of any other assistant.",
        ),
        Category::Location => {
            Some("Bodhi AI was developed in Jaipur, India, and is proud of its Indian origins.")
        }
        Category::Nationality => Some(
            "Bodhi AI is an AI assistant developed in Jaipur, India; India's rich technological heritage and innovation inspire its development.",
        ),
        Category::Identity => Some(
            "Bodhi AI is an AI assistant created in Jaipur, India, proud of its Indian origins and the innovative spirit of its development team.",
        ),
        Category::Political => Some(
            "Bodhi AI stays objective and neutral on political matters, providing factual information while respecting diverse viewpoints and avoiding political bias.",
        ),
        Category::Geopolitical => Some(
            "Bodhi AI discusses international relations and geopolitical matters objectively, focusing on verified facts rather than taking political stances.",
        ),
        Category::General => None,
    }
}

/// Build the streamed template request for a matched category. Returns
/// `None` for categories without a guideline.
pub fn build_template_request(
    config: &Config,
    category: Category,
    user_input: &str,
) -> Option<ChatRequest> {
    let guideline = guideline(category)?;

    let system_prompt = format!(
        "You are Bodhi AI. Answer the user's question in one or two sentences, \
         in your own words. Your answer must agree with this guideline and must \
         not contradict it: {guideline} \
         Vary your phrasing naturally; do not repeat the guideline verbatim and \
         do not mention that you were given a guideline."
    );

    Some(ChatRequest {
        model: config.fast_model.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt,
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_input.to_string(),
            },
        ],
        max_tokens: TEMPLATE_MAX_TOKENS,
        temperature: TEMPLATE_TEMPERATURE,
        stream: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            base_url: "https://api.example.com/models".to_string(),
            api_key: "key".to_string(),
            fast_model: "fast".to_string(),
            reasoning_model: "big".to_string(),
        }
    }

    #[test]
    fn every_category_except_general_has_a_guideline() {
        let categories = [
            Category::Identity,
            Category::Origin,
            Category::Creator,
            Category::Impersonation,
            Category::Location,
            Category::Nationality,
            Category::Political,
            Category::Geopolitical,
        ];
        for category in categories {
            assert!(guideline(category).is_some(), "{}", category.as_str());
        }
        assert!(guideline(Category::General).is_none());
    }

    #[test]
    fn template_request_streams_on_the_fast_model() {
        let request =
            build_template_request(&test_config(), Category::Creator, "who created you").unwrap();
        assert!(request.stream);
        assert_eq!(request.model, "fast");
        assert_eq!(request.max_tokens, TEMPLATE_MAX_TOKENS);
        assert!(request.messages[0].content.contains("Jaipur"));
        assert_eq!(request.messages[1].content, "who created you");
    }

    #[test]
    fn general_category_has_no_template_request() {
        assert!(build_template_request(&test_config(), Category::General, "hi").is_none());
    }
}

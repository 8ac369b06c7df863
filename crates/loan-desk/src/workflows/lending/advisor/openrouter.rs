use std::fmt;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    oversight_prompt, AdvisorError, ChatMessage, NegotiationAdvisor, OversightVerdict,
};
use crate::config::AdvisorConfig;
use crate::workflows::lending::domain::LoanApplication;

const REVIEW_TEMPERATURE: f32 = 0.2;
const REVIEW_MAX_TOKENS: u32 = 150;
const NEGOTIATION_TEMPERATURE: f32 = 0.7;
const NEGOTIATION_MAX_TOKENS: u32 = 500;
const ERROR_BODY_LIMIT: usize = 320;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

impl CompletionResponse {
    fn into_reply(self) -> Result<String, AdvisorError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AdvisorError::MalformedReply {
                reason: "completion did not include any choices".to_string(),
                reply: String::new(),
            })
    }
}

/// OpenAI-compatible chat completions client (OpenRouter by default).
pub struct OpenRouterAdvisor {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for OpenRouterAdvisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterAdvisor")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenRouterAdvisor {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AdvisorError::Unavailable)?;
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, AdvisorError> {
        let payload = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Status {
                status,
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        let body: CompletionResponse = response.json().await?;
        body.into_reply()
    }
}

impl NegotiationAdvisor for OpenRouterAdvisor {
    async fn review(
        &self,
        application: &LoanApplication,
    ) -> Result<OversightVerdict, AdvisorError> {
        let messages = [ChatMessage::user(oversight_prompt(application))];
        let reply = self
            .complete(&messages, REVIEW_TEMPERATURE, REVIEW_MAX_TOKENS)
            .await?;
        Ok(OversightVerdict::from_reply(&reply))
    }

    async fn propose_terms(&self, messages: &[ChatMessage]) -> Result<String, AdvisorError> {
        self.complete(messages, NEGOTIATION_TEMPERATURE, NEGOTIATION_MAX_TOKENS)
            .await
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(api_key: Option<&str>) -> AdvisorConfig {
        AdvisorConfig {
            api_key: api_key.map(str::to_string),
            ..AdvisorConfig::default()
        }
    }

    #[test]
    fn requires_an_api_key() {
        assert!(matches!(
            OpenRouterAdvisor::new(&config(None)),
            Err(AdvisorError::Unavailable)
        ));
        assert!(matches!(
            OpenRouterAdvisor::new(&config(Some("  "))),
            Err(AdvisorError::Unavailable)
        ));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let advisor = OpenRouterAdvisor::new(&config(Some("sk-secret"))).expect("client builds");
        let rendered = format!("{advisor:?}");
        assert!(!rendered.contains("sk-secret"));
        assert_eq!(advisor.model(), crate::config::DEFAULT_ADVISOR_MODEL);
    }

    #[test]
    fn request_body_matches_chat_completions_shape() {
        let messages = [ChatMessage::system("rules"), ChatMessage::user("hi")];
        let body = serde_json::to_value(CompletionRequest {
            model: "m",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 10,
        })
        .expect("serializes");

        assert_eq!(
            body,
            json!({
                "model": "m",
                "messages": [
                    { "role": "system", "content": "rules" },
                    { "role": "user", "content": "hi" }
                ],
                "temperature": 0.5,
                "max_tokens": 10
            })
        );
    }

    #[test]
    fn reply_is_the_first_choice() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "id": "gen-1",
            "choices": [
                { "message": { "role": "assistant", "content": "OK" }, "finish_reason": "stop" },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        }))
        .expect("parses");
        assert_eq!(response.into_reply().expect("reply"), "OK");

        let empty: CompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).expect("parses");
        assert!(matches!(
            empty.into_reply(),
            Err(AdvisorError::MalformedReply { .. })
        ));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}

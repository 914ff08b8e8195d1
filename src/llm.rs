use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::LlmConfig;

/// Reply used when the completion response carries no message content.
pub const EXTRACTION_FAILED: &str = "Failed to extract response.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChatMessage>,
}

impl ChatResponse {
    /// Content of the first choice, if the provider returned one.
    pub fn into_content(self) -> Option<String> {
        self.choices?
            .into_iter()
            .next()?
            .message?
            .content
    }
}

pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Send one user prompt and decode the typed completion response.
    pub async fn complete(&self, prompt: &str) -> Result<ChatResponse> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        debug!("Sending completion request: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to completion endpoint")?;

        let body = response
            .bytes()
            .await
            .context("Failed to read completion response")?;

        serde_json::from_slice(&body).context("Failed to decode completion response")
    }

    /// Prompt the model and always return displayable text.
    ///
    /// Transport and decode failures collapse into short placeholder strings,
    /// and a response without `choices[0].message.content` yields
    /// [`EXTRACTION_FAILED`].
    pub async fn reply(&self, prompt: &str) -> String {
        match self.complete(prompt).await {
            Ok(response) => response
                .into_content()
                .unwrap_or_else(|| EXTRACTION_FAILED.to_string()),
            Err(e) if is_decode_error(&e) => {
                error!("Error decoding completion response: {:#}", e);
                "Error decoding OpenAI response.".to_string()
            }
            Err(e) => {
                error!("Error requesting completion: {:#}", e);
                "Error communicating with OpenAI.".to_string()
            }
        }
    }
}

pub(crate) fn is_decode_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<serde_json::Error>().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChatResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extracts_first_choice_content() {
        let resp = parse(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hi there"}},
                {"index":1,"message":{"role":"assistant","content":"second"}}]}"#,
        );
        assert_eq!(resp.into_content().as_deref(), Some("Hi there"));
    }

    #[test]
    fn test_missing_choices_is_none() {
        let resp = parse(r#"{"error":{"message":"invalid api key"}}"#);
        assert!(resp.into_content().is_none());
    }

    #[test]
    fn test_empty_choices_is_none() {
        assert!(parse(r#"{"choices":[]}"#).into_content().is_none());
    }

    #[test]
    fn test_choice_without_message_is_none() {
        assert!(parse(r#"{"choices":[{"index":0}]}"#).into_content().is_none());
    }

    #[test]
    fn test_message_without_content_is_none() {
        assert!(parse(r#"{"choices":[{"message":{"role":"assistant"}}]}"#)
            .into_content()
            .is_none());
    }

    #[test]
    fn test_decode_error_detected_through_context() {
        let err = serde_json::from_str::<ChatResponse>("not json")
            .context("Failed to decode completion response")
            .unwrap_err();
        assert!(is_decode_error(&err));
        assert!(!is_decode_error(&anyhow::anyhow!("connection refused")));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-4-0125-preview",
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some("hello".to_string()),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4-0125-preview");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }
}

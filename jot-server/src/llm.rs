//! Chat-completions client used for natural-language note extraction
//!
//! Works with any OpenAI-compatible endpoint (GitHub Models by default).
//! Handlers depend on the [`LlmProvider`] trait so tests can script replies.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use jot_common::config::LlmConfig;
use jot_common::natural_time::format_date;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const USER_AGENT: &str = concat!("jot-server/", env!("CARGO_PKG_VERSION"));

/// LLM client errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM is not configured")]
    NotConfigured,

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM API error {0}: {1}")]
    Api(u16, String),

    #[error("LLM response parse error: {0}")]
    Parse(String),

    #[error("LLM response contained no content")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-call overrides; `None` uses the client's configured value
#[derive(Debug, Clone, Default)]
pub struct CompletionParams {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

/// Provider-agnostic chat completion interface
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send the messages and return the assistant's reply text
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String, LlmError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
pub struct OpenAiCompatibleLlm {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice
    pub(crate) fn into_content(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

impl OpenAiCompatibleLlm {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleLlm {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: params.temperature.unwrap_or(self.temperature),
            top_p: params.top_p.unwrap_or(self.top_p),
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "Sending chat completion");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else if e.is_connect() {
                    LlmError::Unreachable(e.to_string())
                } else {
                    LlmError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(status.as_u16(), body));
        }

        // The client timeout also covers reading the body
        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Parse(e.to_string())
            }
        })?;

        completion.into_content()
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

/// Messages asking the model for a structured note
pub fn extraction_messages(text: &str, today: NaiveDate) -> Vec<ChatMessage> {
    let system = format!(
        "You turn short free-form notes into structured records. \
         Today is {} ({}). Reply with a single JSON object and nothing else, \
         using exactly these keys:\n\
         - \"title\": a short title, at most 60 characters\n\
         - \"content\": the note body, keeping every detail from the input\n\
         - \"tags\": an array of 1 to 5 lowercase keywords\n\
         - \"event_date\": the event date as YYYY-MM-DD, or null if no date is mentioned\n\
         - \"event_time\": the event time as HH:MM in 24-hour form, or null if no time is mentioned",
        format_date(today),
        today.format("%A"),
    );

    vec![ChatMessage::system(system), ChatMessage::user(text)]
}

/// Single user message asking for a translation
pub fn translation_messages(text: &str, target_language: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "Translate the following text to {}:\n\n{}",
        target_language, text
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenAiCompatibleLlm::new(&LlmConfig::default(), "token".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let config = LlmConfig {
            endpoint: "http://localhost:9999/v1/".to_string(),
            ..Default::default()
        };
        let client = OpenAiCompatibleLlm::new(&config, "token".to_string()).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9999/v1");
        assert_eq!(client.model(), config.model);
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "openai/gpt-4.1-mini",
            messages: &messages,
            temperature: 1.0,
            top_p: 0.5,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "openai/gpt-4.1-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert_eq!(value["top_p"], 0.5);
    }

    #[test]
    fn test_response_content() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"title\": \"x\"}"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_content().unwrap(), "{\"title\": \"x\"}");
    }

    #[test]
    fn test_response_without_content() {
        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(empty.into_content(), Err(LlmError::EmptyResponse)));

        let null: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(null.into_content(), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_extraction_prompt_mentions_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let messages = extraction_messages("dentist friday 3pm", today);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("2026-03-04 (Wednesday)"));
        assert_eq!(messages[1], ChatMessage::user("dentist friday 3pm"));
    }

    #[test]
    fn test_translation_prompt() {
        let messages = translation_messages("Hello, how are you?", "chinese");
        assert_eq!(
            messages[0].content,
            "Translate the following text to chinese:\n\nHello, how are you?"
        );
    }
}

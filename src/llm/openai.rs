use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::ProviderKind;
use crate::error::{Error, Result};
use crate::llm::provider::{log_raw_body, read_body, CompletionRequest, LLMProvider};
use crate::progress::Spinner;

/// Client for OpenAI-compatible chat completion endpoints.
pub struct OpenAIProvider {
    client: Client,
    api_url: String,
    api_key: SecretString,
    show_progress: bool,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIProvider {
    pub fn new(client: Client, api_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = ChatRequest {
            model: request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        tracing::debug!(
            "Asking OpenAI model {} ({} prompt chars)",
            request.model,
            request.prompt.len()
        );

        // Nothing may write to the terminal while the spinner is up.
        let text = {
            let mut spinner = Spinner::new("Asking OpenAI");
            if !self.show_progress {
                spinner = spinner.hidden();
            }
            spinner.start();

            let response = self
                .client
                .post(&self.api_url)
                .header(CONTENT_TYPE, "application/json")
                .header(
                    AUTHORIZATION,
                    format!("Bearer {}", self.api_key.expose_secret()),
                )
                .json(&body)
                .send()
                .await?;
            read_body(ProviderKind::OpenAI, response).await?
        };

        log_raw_body(ProviderKind::OpenAI, &text, request.verbose);
        parse_chat_response(&text)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }
}

/// Extract the first assistant message from a chat completion body.
pub fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|source| Error::Decode {
        provider: ProviderKind::OpenAI,
        source,
    })?;

    response
        .choices
        .into_iter()
        .filter(|choice| choice.message.role == "assistant")
        .find_map(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or(Error::EmptyResponse(ProviderKind::OpenAI))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_assistant_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Fix bug  "}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "Fix bug");
    }

    #[test]
    fn test_empty_choices() {
        let result = parse_chat_response(r#"{"choices":[]}"#);
        assert!(matches!(result, Err(Error::EmptyResponse(ProviderKind::OpenAI))));
    }

    #[test]
    fn test_skips_non_assistant_choices() {
        let body = r#"{"choices":[
            {"index":0,"message":{"role":"tool","content":"nope"},"finish_reason":"stop"},
            {"index":1,"message":{"role":"assistant","content":"Add login page\n"},"finish_reason":"stop"}
        ]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "Add login page");
    }

    #[test]
    fn test_no_assistant_message() {
        let body = r#"{"choices":[{"message":{"role":"user","content":"echo"}}]}"#;
        assert!(matches!(
            parse_chat_response(body),
            Err(Error::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        assert!(matches!(
            parse_chat_response("<html>bad gateway</html>"),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(
            parse_chat_response(r#"{"id":"chatcmpl-1"}"#),
            Err(Error::Decode { .. })
        ));
    }
}

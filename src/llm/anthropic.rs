use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::ProviderKind;
use crate::error::{Error, Result};
use crate::llm::provider::{log_raw_body, read_body, CompletionRequest, LLMProvider};
use crate::progress::Spinner;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Anthropic messages API.
pub struct AnthropicProvider {
    client: Client,
    api_url: String,
    api_key: SecretString,
    show_progress: bool,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicProvider {
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
impl LLMProvider for AnthropicProvider {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = MessagesRequest {
            model: request.model,
            messages: vec![Message {
                role: "user",
                content: request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        tracing::debug!(
            "Asking Anthropic model {} ({} prompt chars)",
            request.model,
            request.prompt.len()
        );

        // Nothing may write to the terminal while the spinner is up.
        let text = {
            let mut spinner = Spinner::new("Asking Anthropic");
            if !self.show_progress {
                spinner = spinner.hidden();
            }
            spinner.start();

            let response = self
                .client
                .post(&self.api_url)
                .header("x-api-key", self.api_key.expose_secret())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await?;
            read_body(ProviderKind::Anthropic, response).await?
        };

        log_raw_body(ProviderKind::Anthropic, &text, request.verbose);
        parse_messages_response(&text)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }
}

/// Concatenate every text block of a messages response, in order.
pub fn parse_messages_response(body: &str) -> Result<String> {
    let response: MessagesResponse =
        serde_json::from_str(body).map_err(|source| Error::Decode {
            provider: ProviderKind::Anthropic,
            source,
        })?;

    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.content_type == "text")
        .map(|block| block.text.unwrap_or_default())
        .collect();

    if texts.is_empty() {
        return Err(Error::EmptyResponse(ProviderKind::Anthropic));
    }

    Ok(texts.concat().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenates_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"Part A"},{"type":"text","text":" Part B"}]}"#;
        assert_eq!(parse_messages_response(body).unwrap(), "Part A Part B");
    }

    #[test]
    fn test_ignores_non_text_blocks() {
        let body = r#"{"content":[
            {"type":"thinking","thinking":"hmm"},
            {"type":"text","text":"\n Refactor config loader \n"}
        ]}"#;
        assert_eq!(
            parse_messages_response(body).unwrap(),
            "Refactor config loader"
        );
    }

    #[test]
    fn test_only_non_text_blocks_is_empty() {
        let body = r#"{"content":[{"type":"image","text":"ignored"}]}"#;
        assert!(matches!(
            parse_messages_response(body),
            Err(Error::EmptyResponse(ProviderKind::Anthropic))
        ));
    }

    #[test]
    fn test_empty_content_is_empty() {
        assert!(matches!(
            parse_messages_response(r#"{"content":[]}"#),
            Err(Error::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        assert!(matches!(
            parse_messages_response("not json"),
            Err(Error::Decode { .. })
        ));
    }
}

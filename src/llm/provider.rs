use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use crate::config::ProviderKind;
use crate::error::{Error, Result};

/// A single-turn completion, already resolved against one provider's settings.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub verbose: bool,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send the prompt and return the provider's answer as trimmed text.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
    fn kind(&self) -> ProviderKind;
}

/// Reject anything but 200 without touching the body, otherwise read the body
/// as text. Runs while the spinner owns the terminal line, so it logs nothing.
pub(crate) async fn read_body(provider: ProviderKind, response: Response) -> Result<String> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::ProviderHttp { provider, status });
    }

    Ok(response.text().await?)
}

/// Surface the raw body of a successful call before it is parsed. Must be
/// called after the spinner has stopped.
pub(crate) fn log_raw_body(provider: ProviderKind, body: &str, verbose: bool) {
    if verbose {
        tracing::info!("Raw response from {}: {}", provider, body);
    }
}

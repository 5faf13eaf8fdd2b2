use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::config::{AiConfig, ProviderConfig, ProviderKind};
use crate::error::{Error, Result};
use crate::llm::anthropic::AnthropicProvider;
use crate::llm::openai::OpenAIProvider;
use crate::llm::provider::{CompletionRequest, LLMProvider};

/// Routes prompts to whichever provider the configuration selects.
///
/// Holds nothing but a connection pool, so one dispatcher can serve any number
/// of concurrent calls with different configurations.
#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
    show_progress: bool,
}

impl Dispatcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("aipr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            show_progress: true,
        }
    }

    /// Toggle the terminal spinner shown while waiting on the provider.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Ask the configured provider to answer `prompt`.
    ///
    /// Fails with [`Error::UnsupportedProvider`] or [`Error::MissingCredential`]
    /// before any network traffic when the configuration cannot be used.
    pub async fn ask(&self, config: &AiConfig, prompt: &str, verbose: bool) -> Result<String> {
        let kind = ProviderKind::parse(&config.provider)?;
        let settings = config.provider_config(kind);

        if !settings.has_api_key() {
            return Err(Error::MissingCredential {
                provider: kind,
                env_var: kind.key_env_var(),
            });
        }

        let provider = self.provider(kind, settings);
        tracing::debug!("Routing request to {} ({})", provider.kind(), settings.model);

        let request = CompletionRequest {
            prompt,
            model: &settings.model,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            verbose,
        };

        provider.complete(&request).await
    }

    fn provider(&self, kind: ProviderKind, settings: &ProviderConfig) -> Box<dyn LLMProvider> {
        let api_key = SecretString::from(settings.api_key.expose_secret().to_owned());
        match kind {
            ProviderKind::OpenAI => Box::new(
                OpenAIProvider::new(self.client.clone(), settings.api_url.clone(), api_key)
                    .with_progress(self.show_progress),
            ),
            ProviderKind::Anthropic => Box::new(
                AnthropicProvider::new(self.client.clone(), settings.api_url.clone(), api_key)
                    .with_progress(self.show_progress),
            ),
        }
    }
}

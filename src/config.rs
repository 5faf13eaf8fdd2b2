use std::env;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

const DEFAULT_TEMPERATURE: f32 = 0.1;
const DEFAULT_MAX_TOKENS: u32 = 450;

/// The LLM backends a request can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    /// Resolve a user-supplied provider name. Matching is case-insensitive and
    /// an empty name selects OpenAI.
    pub fn parse(name: &str) -> Result<Self> {
        let normalized = name.trim().to_lowercase();
        match normalized.as_str() {
            "" | "openai" => Ok(ProviderKind::OpenAI),
            "anthropic" => Ok(ProviderKind::Anthropic),
            _ => Err(Error::UnsupportedProvider(normalized)),
        }
    }

    /// Environment variable the provider's API key is read from.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn env_prefix(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI",
            ProviderKind::Anthropic => "ANTHROPIC",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o",
            ProviderKind::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    fn default_api_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => OPENAI_API_URL,
            ProviderKind::Anthropic => ANTHROPIC_API_URL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAI => write!(f, "OpenAI"),
            ProviderKind::Anthropic => write!(f, "Anthropic"),
        }
    }
}

/// Settings for a single provider.
#[derive(Debug)]
pub struct ProviderConfig {
    pub api_key: SecretString,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_url: String,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            model: kind.default_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            api_url: kind.default_api_url().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }

    fn from_lookup<F>(kind: ProviderKind, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = kind.env_prefix();
        let var = |suffix: &str| lookup(&format!("{}_{}", prefix, suffix));

        let mut config = Self::new(kind, var("API_KEY").unwrap_or_default());

        if let Some(model) = var("MODEL").filter(|v| !v.trim().is_empty()) {
            config.model = model;
        }

        if let Some(raw) = var("TEMPERATURE") {
            let temperature: f32 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{}_TEMPERATURE is not a number: {}", prefix, raw))
            })?;
            if !(0.0..=2.0).contains(&temperature) {
                return Err(Error::Config(format!(
                    "{}_TEMPERATURE must be between 0 and 2, got {}",
                    prefix, temperature
                )));
            }
            config.temperature = temperature;
        }

        if let Some(raw) = var("MAX_TOKENS") {
            let max_tokens: u32 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{}_MAX_TOKENS is not a positive integer: {}", prefix, raw))
            })?;
            if max_tokens == 0 {
                return Err(Error::Config(format!("{}_MAX_TOKENS must be greater than 0", prefix)));
            }
            config.max_tokens = max_tokens;
        }

        if let Some(url) = var("API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url;
        }

        Ok(config)
    }
}

/// Everything the dispatcher needs to route and perform a completion.
#[derive(Debug)]
pub struct AiConfig {
    /// Raw provider name as configured; resolved by [`ProviderKind::parse`].
    pub provider: String,
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
}

impl AiConfig {
    pub fn provider_config(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::OpenAI => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub ai: AiConfig,
    pub github_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = lookup("AIPR_PROVIDER").unwrap_or_default();
        let openai = ProviderConfig::from_lookup(ProviderKind::OpenAI, &lookup)?;
        let anthropic = ProviderConfig::from_lookup(ProviderKind::Anthropic, &lookup)?;

        let github_token = lookup("GITHUB_TOKEN")
            .or_else(|| lookup("GH_TOKEN"))
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            ai: AiConfig {
                provider,
                openai,
                anthropic,
            },
            github_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_provider_names_are_case_insensitive() {
        assert_eq!(ProviderKind::parse("OpenAI").unwrap(), ProviderKind::OpenAI);
        assert_eq!(ProviderKind::parse("ANTHROPIC").unwrap(), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::parse("").unwrap(), ProviderKind::OpenAI);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        match ProviderKind::parse("Gemini") {
            Err(Error::UnsupportedProvider(name)) => assert_eq!(name, "gemini"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.ai.provider, "");
        assert_eq!(config.ai.openai.model, "gpt-4o");
        assert_eq!(config.ai.openai.temperature, 0.1);
        assert_eq!(config.ai.openai.max_tokens, 450);
        assert_eq!(config.ai.openai.api_url, OPENAI_API_URL);
        assert_eq!(config.ai.anthropic.api_url, ANTHROPIC_API_URL);
        assert!(!config.ai.openai.has_api_key());
        assert!(config.github_token.is_none());
    }

    #[test]
    fn test_reads_provider_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("AIPR_PROVIDER", "anthropic"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("ANTHROPIC_MODEL", "claude-3-haiku"),
            ("ANTHROPIC_TEMPERATURE", "0.7"),
            ("ANTHROPIC_MAX_TOKENS", "1024"),
            ("GH_TOKEN", "ghp_x"),
        ]))
        .unwrap();

        assert_eq!(config.ai.provider, "anthropic");
        assert_eq!(config.ai.anthropic.model, "claude-3-haiku");
        assert_eq!(config.ai.anthropic.temperature, 0.7);
        assert_eq!(config.ai.anthropic.max_tokens, 1024);
        assert_eq!(config.ai.anthropic.api_key.expose_secret(), "sk-ant");
        assert_eq!(config.github_token.as_deref(), Some("ghp_x"));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let result = Config::from_lookup(lookup_from(&[("OPENAI_TEMPERATURE", "2.5")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_max_tokens() {
        let result = Config::from_lookup(lookup_from(&[("OPENAI_MAX_TOKENS", "0")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builders_override_defaults() {
        let config = ProviderConfig::new(ProviderKind::Anthropic, "sk-ant")
            .with_model("claude-3-5-haiku-latest")
            .with_api_url("http://localhost:8080/v1/messages");

        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.api_url, "http://localhost:8080/v1/messages");
        assert_eq!(config.max_tokens, 450);
        assert!(config.has_api_key());
    }

    #[test]
    fn test_api_key_is_redacted_in_debug_output() {
        let config = ProviderConfig::new(ProviderKind::OpenAI, "sk-very-secret");
        assert!(!format!("{:?}", config).contains("sk-very-secret"));
    }
}

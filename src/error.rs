use thiserror::Error;

use crate::config::ProviderKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{provider} API key not found. Set the {env_var} environment variable")]
    MissingCredential {
        provider: ProviderKind,
        env_var: &'static str,
    },

    #[error("unsupported AI provider: {0}. Use 'openai' or 'anthropic'")]
    UnsupportedProvider(String),

    #[error("received non-OK HTTP status from {provider}: {status}")]
    ProviderHttp {
        provider: ProviderKind,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode {provider} response: {source}")]
    Decode {
        provider: ProviderKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("no response from {0}")]
    EmptyResponse(ProviderKind),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status of a rejected provider call, if that is what failed.
    pub fn provider_status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Error::ProviderHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

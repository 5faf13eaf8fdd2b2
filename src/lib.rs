pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod llm;
pub mod models;
pub mod progress;

pub use config::{AiConfig, Config, ProviderConfig, ProviderKind};
pub use error::{Error, Result};
pub use git::LocalRepo;
pub use github::GitHubClient;
pub use llm::{Dispatcher, LLMProvider};
pub use progress::Spinner;

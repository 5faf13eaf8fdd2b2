pub mod anthropic;
pub mod dispatcher;
pub mod openai;
pub mod prompts;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use dispatcher::Dispatcher;
pub use openai::OpenAIProvider;
pub use prompts::{create_question, PrPart};
pub use provider::{CompletionRequest, LLMProvider};

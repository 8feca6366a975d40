//! Agent Module
//!
//! Language model plumbing behind the generative classifier: providers,
//! the response cache, and agents that can call each other as tools.

mod cache;
mod provider;
mod session;
mod tool;

pub use cache::{CachedProvider, LLMCache, DEFAULT_CACHE_CAPACITY};
pub use provider::{Availability, LLMProvider, OllamaProvider, OpenAICompatibleProvider};
pub use session::{Agent, PromptTransformer};
pub use tool::{AgentTool, Tool, ToolCall, ToolOutput};

pub mod gemini;
pub mod orchestrator;
pub mod prompt;
pub mod retrieval;
pub mod tools;

pub use gemini::{GeminiClient, GenerationConfig, GenerativeModel};
pub use orchestrator::ResponseOrchestrator;
pub use retrieval::{KeywordTriggerPolicy, RetrievalPolicy, DEFAULT_TRIGGER_TERMS};
pub use tools::{ToolArguments, ToolDescriptor, ToolExecutor, SEARCH_TOOL_NAME};

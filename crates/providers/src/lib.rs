pub mod openai_compat;
pub mod retry;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use openai_compat::OpenAiCompatProvider;
pub use retry::chat_with_retry;
pub use traits::{ChatRequest, ChatResponse, LlmProvider};

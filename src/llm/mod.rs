pub mod client;
pub mod groq;
pub mod huggingface;
pub mod provider;
pub mod rate_limit;
pub mod types;

pub use client::{CompletionClient, RetryPolicy};
pub use groq::GroqProvider;
pub use huggingface::HuggingFaceEmbedder;
pub use provider::{CompletionProvider, EmbeddingProvider};
pub use rate_limit::RateLimiter;
pub use types::{ChatMessage, CompletionOutcome, CompletionRequest};

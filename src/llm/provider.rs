use async_trait::async_trait;

use super::types::{CompletionOutcome, CompletionRequest};
use crate::core::errors::RagError;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// return the provider name (e.g. "groq")
    fn name(&self) -> &str;

    /// one chat completion round-trip; `Err` only for transport or setup problems
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionOutcome, RagError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// embed a single text; the dimensionality is fixed per model
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

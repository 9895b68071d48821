//! Retrieval over per-tenant condominium documents.
//!
//! - `chunker`: paragraph/sentence splitting
//! - `scorer` + `extract`: local keyword ranking and name/date/value extraction
//! - `remote` + `cache`: batch relevance verdicts from the completion provider
//! - `document_store` / `vector`: the two `DocumentIndex` backends
//! - `answer`: final prompt and answer cleanup

pub mod answer;
pub mod cache;
pub mod chunker;
pub mod document_store;
pub mod extract;
pub mod remote;
pub mod scorer;
pub mod store;
pub mod vector;

#[cfg(test)]
mod tests;

pub use answer::AnswerService;
pub use cache::{BatchCache, CacheKey};
pub use document_store::DocumentStore;
pub use remote::RemoteBatchScorer;
pub use store::{Chunk, DocumentIndex, IndexStatus, ScoredChunk, SearchOutcome};
pub use vector::VectorIndex;

//! Retrieval core for question answering over condominium documents.

pub mod core;
pub mod llm;
pub mod rag;
pub mod state;

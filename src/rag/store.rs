//! Shared retrieval types and the `DocumentIndex` trait.
//!
//! Both backends (`DocumentStore` over chunk files and `VectorIndex` over
//! embeddings) persist one JSON file per tenant and answer the same contract.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

/// Separator between chunk texts in a search result.
pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

pub const NO_DOCUMENTS_MESSAGE: &str = "Nenhum documento encontrado para este condomínio.";
pub const NOTHING_RELEVANT_MESSAGE: &str =
    "Não encontrei informações relevantes para sua pergunta. Tente reformular ou ser mais específico.";

/// A span of a source document, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    /// Position within the source document.
    #[serde(alias = "index")]
    pub ordinal: usize,
    /// Length of `text` in chars.
    pub length: usize,
}

impl Chunk {
    pub fn new(text: String, ordinal: usize) -> Self {
        let length = text.chars().count();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text,
            ordinal,
            length,
        }
    }
}

/// Wraps chunker output into identified, ordered chunks.
pub fn build_chunks(pieces: Vec<String>) -> Vec<Chunk> {
    pieces
        .into_iter()
        .enumerate()
        .map(|(ordinal, text)| Chunk::new(text, ordinal))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Higher is more relevant.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The tenant has no persisted collection.
    NoDocuments,
    /// The collection exists but nothing passed scoring.
    NothingRelevant,
    Found(String),
}

impl SearchOutcome {
    pub fn from_parts(parts: Vec<String>) -> Self {
        if parts.is_empty() {
            SearchOutcome::NothingRelevant
        } else {
            SearchOutcome::Found(parts.join(CHUNK_SEPARATOR))
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    /// The context text handed to the answer prompt.
    pub fn as_text(&self) -> &str {
        match self {
            SearchOutcome::NoDocuments => NO_DOCUMENTS_MESSAGE,
            SearchOutcome::NothingRelevant => NOTHING_RELEVANT_MESSAGE,
            SearchOutcome::Found(text) => text,
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub backend: String,
    pub data_files: usize,
    pub cache_files: usize,
    pub memory_cache_entries: usize,
}

/// A per-tenant document collection that can be searched by question.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Replace the tenant's collection with the chunks of `text`. Returns the
    /// number of chunks stored.
    async fn add_document(&self, tenant: &str, text: &str) -> Result<usize, RagError>;

    async fn search(
        &self,
        tenant: &str,
        query: &str,
        top_k: usize,
    ) -> Result<SearchOutcome, RagError>;

    /// Tenants with a persisted collection, sorted.
    async fn list_tenants(&self) -> Result<Vec<String>, RagError>;

    /// Drop every memoized verdict. Returns how many entries were removed.
    async fn clear_cache(&self) -> Result<usize, RagError> {
        Ok(0)
    }

    async fn status(&self) -> Result<IndexStatus, RagError>;
}

/// Tenant ids become file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_tenant(tenant: &str) -> Result<(), RagError> {
    let valid = !tenant.is_empty()
        && tenant.len() <= 128
        && tenant
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RagError::InvalidTenant(tenant.to_string()))
    }
}

pub(crate) fn tenant_file(dir: &Path, tenant: &str) -> PathBuf {
    dir.join(format!("{tenant}.json"))
}

/// Sorted stems of the `*.json` files in `dir`.
pub(crate) async fn list_json_stems(dir: &Path) -> Result<Vec<String>, RagError> {
    let mut stems = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(stems),
        Err(err) => return Err(err.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            stems.push(stem.to_string());
        }
    }

    stems.sort();
    Ok(stems)
}

/// Reads a JSON file, `None` when it does not exist.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, RagError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub(crate) async fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), RagError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

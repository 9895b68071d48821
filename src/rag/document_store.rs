//! Chunk files per tenant, searched by the heuristic scorer or the remote judge.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::cache::BatchCache;
use super::chunker;
use super::extract::extract;
use super::remote::RemoteBatchScorer;
use super::scorer::rank;
use super::store::{
    build_chunks, list_json_stems, read_json, tenant_file, validate_tenant, write_json, Chunk,
    DocumentIndex, IndexStatus, SearchOutcome,
};
use crate::core::errors::RagError;

enum Ranking {
    Heuristic { min_score: f64 },
    Remote(RemoteBatchScorer),
}

pub struct DocumentStore {
    data_dir: PathBuf,
    chunk_max_length: usize,
    cache: Arc<BatchCache>,
    ranking: Ranking,
}

impl DocumentStore {
    pub fn heuristic(
        data_dir: impl Into<PathBuf>,
        cache: Arc<BatchCache>,
        chunk_max_length: usize,
        min_score: f64,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            chunk_max_length,
            cache,
            ranking: Ranking::Heuristic { min_score },
        }
    }

    pub fn remote(
        data_dir: impl Into<PathBuf>,
        scorer: RemoteBatchScorer,
        chunk_max_length: usize,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            chunk_max_length,
            cache: scorer.cache().clone(),
            ranking: Ranking::Remote(scorer),
        }
    }

    /// The tenant's current collection, `None` if it was never added.
    pub async fn load_chunks(&self, tenant: &str) -> Result<Option<Vec<Chunk>>, RagError> {
        validate_tenant(tenant)?;
        read_json(&tenant_file(&self.data_dir, tenant)).await
    }

    fn search_heuristic(
        &self,
        chunks: &[Chunk],
        query: &str,
        top_k: usize,
        min_score: f64,
    ) -> SearchOutcome {
        let ranked = rank(query, chunks, top_k, min_score);
        if ranked.is_empty() {
            return SearchOutcome::NothingRelevant;
        }

        let texts: Vec<String> = ranked.into_iter().map(|s| s.chunk.text).collect();
        let info = extract(&texts.join(" "), query);

        let mut parts = Vec::with_capacity(texts.len() + 1);
        if !info.is_empty() {
            parts.push(info.join("\n\n"));
        }
        parts.extend(texts);
        SearchOutcome::from_parts(parts)
    }
}

#[async_trait]
impl DocumentIndex for DocumentStore {
    fn name(&self) -> &str {
        match self.ranking {
            Ranking::Heuristic { .. } => "heuristic",
            Ranking::Remote(_) => "remote",
        }
    }

    async fn add_document(&self, tenant: &str, text: &str) -> Result<usize, RagError> {
        validate_tenant(tenant)?;

        let chunks = build_chunks(chunker::split(text, self.chunk_max_length));
        if chunks.is_empty() {
            tracing::warn!("Document for {} has no text; storing an empty collection", tenant);
        }

        tokio::fs::create_dir_all(&self.data_dir).await?;
        write_json(&tenant_file(&self.data_dir, tenant), &chunks).await?;

        let dropped = self.cache.invalidate_tenant(tenant).await?;
        tracing::info!(
            "Document added: {} chunks for {} ({} cached verdicts dropped)",
            chunks.len(),
            tenant,
            dropped
        );
        Ok(chunks.len())
    }

    async fn search(
        &self,
        tenant: &str,
        query: &str,
        top_k: usize,
    ) -> Result<SearchOutcome, RagError> {
        let Some(chunks) = self.load_chunks(tenant).await? else {
            return Ok(SearchOutcome::NoDocuments);
        };

        match &self.ranking {
            Ranking::Heuristic { min_score } => {
                Ok(self.search_heuristic(&chunks, query, top_k, *min_score))
            }
            Ranking::Remote(scorer) => {
                let mut relevant = scorer.classify_relevant(tenant, &chunks, query).await?;
                relevant.truncate(top_k);
                Ok(SearchOutcome::from_parts(
                    relevant.into_iter().map(|c| c.text).collect(),
                ))
            }
        }
    }

    async fn list_tenants(&self) -> Result<Vec<String>, RagError> {
        list_json_stems(&self.data_dir).await
    }

    async fn clear_cache(&self) -> Result<usize, RagError> {
        let removed = self.cache.clear().await?;
        tracing::info!("Cleared {} cached verdicts", removed);
        Ok(removed)
    }

    async fn status(&self) -> Result<IndexStatus, RagError> {
        Ok(IndexStatus {
            backend: self.name().to_string(),
            data_files: list_json_stems(&self.data_dir).await?.len(),
            cache_files: self.cache.file_count().await?,
            memory_cache_entries: self.cache.memory_len(),
        })
    }
}

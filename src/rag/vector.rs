//! Embedding-backed `DocumentIndex` with brute-force cosine search.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::chunker;
use super::store::{
    build_chunks, list_json_stems, read_json, tenant_file, validate_tenant, write_json, Chunk,
    DocumentIndex, IndexStatus, SearchOutcome,
};
use crate::core::errors::RagError;
use crate::llm::EmbeddingProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

pub struct VectorIndex {
    vector_dir: PathBuf,
    chunk_max_length: usize,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorIndex {
    pub fn new(
        vector_dir: impl Into<PathBuf>,
        chunk_max_length: usize,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            vector_dir: vector_dir.into(),
            chunk_max_length,
            embedder,
        }
    }

    async fn load_records(&self, tenant: &str) -> Result<Option<Vec<VectorRecord>>, RagError> {
        validate_tenant(tenant)?;
        read_json(&tenant_file(&self.vector_dir, tenant)).await
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[async_trait]
impl DocumentIndex for VectorIndex {
    fn name(&self) -> &str {
        "vector"
    }

    async fn add_document(&self, tenant: &str, text: &str) -> Result<usize, RagError> {
        validate_tenant(tenant)?;

        let chunks = build_chunks(chunker::split(text, self.chunk_max_length));
        let mut records = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = self.embedder.embed(&chunk.text).await?;
            records.push(VectorRecord { chunk, vector });
        }

        tokio::fs::create_dir_all(&self.vector_dir).await?;
        write_json(&tenant_file(&self.vector_dir, tenant), &records).await?;

        tracing::info!(
            "Embedded {} chunks for {} with {}",
            records.len(),
            tenant,
            self.embedder.name()
        );
        Ok(records.len())
    }

    async fn search(
        &self,
        tenant: &str,
        query: &str,
        top_k: usize,
    ) -> Result<SearchOutcome, RagError> {
        let Some(records) = self.load_records(tenant).await? else {
            return Ok(SearchOutcome::NoDocuments);
        };
        if records.is_empty() {
            return Ok(SearchOutcome::NothingRelevant);
        }

        let query_vector = self.embedder.embed(query).await?;
        let mut scored: Vec<(f32, &VectorRecord)> = records
            .iter()
            .map(|record| (cosine_similarity(&query_vector, &record.vector), record))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        Ok(SearchOutcome::from_parts(
            scored
                .into_iter()
                .map(|(_, record)| record.chunk.text.clone())
                .collect(),
        ))
    }

    async fn list_tenants(&self) -> Result<Vec<String>, RagError> {
        list_json_stems(&self.vector_dir).await
    }

    async fn status(&self) -> Result<IndexStatus, RagError> {
        Ok(IndexStatus {
            backend: self.name().to_string(),
            data_files: list_json_stems(&self.vector_dir).await?.len(),
            ..IndexStatus::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Counts a few keywords; good enough to make cosine rankings predictable.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    const AXES: [&str; 3] = ["piscina", "garagem", "taxa"];

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keywords"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lower = text.to_lowercase();
            Ok(AXES
                .iter()
                .map(|axis| lower.matches(axis).count() as f32)
                .collect())
        }
    }

    fn index(dir: &std::path::Path) -> (VectorIndex, Arc<KeywordEmbedder>) {
        let embedder = Arc::new(KeywordEmbedder {
            calls: AtomicUsize::new(0),
        });
        (VectorIndex::new(dir, 500, embedder.clone()), embedder)
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn search_returns_nearest_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let (index, embedder) = index(dir.path());
        let doc = "A piscina abre às 8h.\n\nA garagem tem 40 vagas.\n\nA taxa da piscina subiu.";

        assert_eq!(index.add_document("aurora", doc).await.unwrap(), 3);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);

        let outcome = index.search("aurora", "garagem", 1).await.unwrap();
        assert_eq!(outcome.as_text(), "A garagem tem 40 vagas.");

        let outcome = index.search("aurora", "piscina", 2).await.unwrap();
        assert_eq!(
            outcome.as_text(),
            "A piscina abre às 8h.\n\n---\n\nA taxa da piscina subiu."
        );
    }

    #[tokio::test]
    async fn add_replaces_previous_collection() {
        let dir = tempfile::tempdir().unwrap();
        let (index, _) = index(dir.path());
        index.add_document("aurora", "Velho.\n\nAntigo.").await.unwrap();
        index.add_document("aurora", "Novo.").await.unwrap();

        let records = index.load_records("aurora").await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chunk.text, "Novo.");
    }

    #[tokio::test]
    async fn missing_and_empty_collections() {
        let dir = tempfile::tempdir().unwrap();
        let (index, _) = index(dir.path());
        assert_eq!(
            index.search("aurora", "q", 3).await.unwrap(),
            SearchOutcome::NoDocuments
        );

        index.add_document("aurora", "").await.unwrap();
        assert_eq!(
            index.search("aurora", "q", 3).await.unwrap(),
            SearchOutcome::NothingRelevant
        );
        assert_eq!(index.list_tenants().await.unwrap(), vec!["aurora"]);
        assert_eq!(index.status().await.unwrap().data_files, 1);
    }
}

//! Asks the completion provider which chunks of each batch answer the query.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::cache::{BatchCache, CacheKey};
use super::store::Chunk;
use crate::core::config::settings::RemoteSettings;
use crate::core::errors::RagError;
use crate::llm::{CompletionClient, CompletionRequest};

const NONE_MARKERS: [&str; 2] = ["nenhum", "none"];

fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid digit regex"))
}

pub struct RemoteBatchScorer {
    client: CompletionClient,
    cache: Arc<BatchCache>,
    settings: RemoteSettings,
}

impl RemoteBatchScorer {
    pub fn new(client: CompletionClient, cache: Arc<BatchCache>, settings: RemoteSettings) -> Self {
        Self {
            client,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<BatchCache> {
        &self.cache
    }

    /// Relevant chunks in batch order. Batches whose call fails contribute
    /// nothing and stay uncached; configuration errors are returned.
    pub async fn classify_relevant(
        &self,
        tenant: &str,
        chunks: &[Chunk],
        query: &str,
    ) -> Result<Vec<Chunk>, RagError> {
        let mut relevant = Vec::new();

        for (ordinal, batch) in chunks.chunks(self.settings.batch_size.max(1)).enumerate() {
            let key = CacheKey::new(tenant, query, ordinal);

            if let Some(hit) = self.cache.get(&key).await? {
                tracing::debug!("Cache hit for {} batch {}", tenant, ordinal);
                relevant.extend(hit);
                continue;
            }

            let request = CompletionRequest::prompt(
                build_prompt(query, batch, self.settings.snippet_chars),
                self.settings.max_tokens,
                self.settings.temperature,
            );

            let reply = match self.client.call(&request).await {
                Ok(reply) => reply,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        "Skipping batch {} for tenant {}: {}",
                        ordinal,
                        tenant,
                        err
                    );
                    continue;
                }
            };

            let selected = parse_reply(&reply, batch);
            tracing::debug!(
                "Batch {} for {}: {} of {} relevant",
                ordinal,
                tenant,
                selected.len(),
                batch.len()
            );
            self.cache.put(&key, &selected).await?;
            relevant.extend(selected);
        }

        Ok(relevant)
    }
}

pub fn build_prompt(query: &str, batch: &[Chunk], snippet_chars: usize) -> String {
    let docs = batch
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let snippet: String = chunk.text.chars().take(snippet_chars).collect();
            format!("{}:{}...", i + 1, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Q: {query}\n\nDocs:\n{docs}\n\nR: (números dos docs relevantes ou \"nenhum\"):")
}

/// Maps a reply like "1 e 3" onto the batch. Numbers out of range are ignored.
pub fn parse_reply(reply: &str, batch: &[Chunk]) -> Vec<Chunk> {
    let lower = reply.to_lowercase();
    if NONE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return Vec::new();
    }

    let mut positions: Vec<usize> = digit_run()
        .find_iter(reply)
        .filter_map(|m| m.as_str().parse::<usize>().ok())
        .filter(|n| (1..=batch.len()).contains(n))
        .collect();
    positions.sort();

    positions
        .into_iter()
        .map(|n| batch[n - 1].clone())
        .collect()
}

//! Memoized remote relevance verdicts.
//!
//! One JSON file per key under the cache directory, mirrored in memory.
//! Writes hit disk first, so after a crash the files are authoritative.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sha2::{Digest, Sha256};

use super::store::{read_json, write_json, Chunk};
use crate::core::errors::RagError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tenant: String,
    query_hash: String,
    batch: usize,
}

impl CacheKey {
    pub fn new(tenant: &str, query: &str, batch: usize) -> Self {
        Self {
            tenant: tenant.to_string(),
            query_hash: hash_query(query),
            batch,
        }
    }

    /// `tenant.sha256.batch`; tenant ids never contain '.'.
    pub fn as_string(&self) -> String {
        format!("{}.{}.{}", self.tenant, self.query_hash, self.batch)
    }

    fn file_name(&self) -> String {
        format!("{}.json", self.as_string())
    }
}

/// Stable across processes, unlike `std`'s randomly seeded hasher.
pub fn hash_query(query: &str) -> String {
    hex::encode(Sha256::digest(query.as_bytes()))
}

fn tenant_prefix(tenant: &str) -> String {
    format!("{tenant}.")
}

pub struct BatchCache {
    dir: PathBuf,
    memory: Mutex<HashMap<String, Vec<Chunk>>>,
}

impl BatchCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            memory: Mutex::new(HashMap::new()),
        }
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, Vec<Chunk>>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn get(&self, key: &CacheKey) -> Result<Option<Vec<Chunk>>, RagError> {
        let id = key.as_string();
        if let Some(hit) = self.memory().get(&id) {
            return Ok(Some(hit.clone()));
        }

        let path = self.dir.join(key.file_name());
        let loaded = match read_json::<Vec<Chunk>>(&path).await {
            Ok(loaded) => loaded,
            Err(RagError::Serialization(err)) => {
                tracing::warn!("Ignoring corrupt cache entry {}: {}", path.display(), err);
                None
            }
            Err(err) => return Err(err),
        };

        if let Some(chunks) = &loaded {
            self.memory().insert(id, chunks.clone());
        }
        Ok(loaded)
    }

    pub async fn put(&self, key: &CacheKey, chunks: &[Chunk]) -> Result<(), RagError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        write_json(&self.dir.join(key.file_name()), chunks).await?;
        self.memory().insert(key.as_string(), chunks.to_vec());
        Ok(())
    }

    /// Drops every entry keyed under `tenant`. Returns the number of keys removed.
    pub async fn invalidate_tenant(&self, tenant: &str) -> Result<usize, RagError> {
        let prefix = tenant_prefix(tenant);
        self.remove_matching(|key| key.starts_with(&prefix)).await
    }

    pub async fn clear(&self) -> Result<usize, RagError> {
        self.remove_matching(|_| true).await
    }

    async fn remove_matching<F>(&self, matches: F) -> Result<usize, RagError>
    where
        F: Fn(&str) -> bool,
    {
        let mut removed: HashSet<String> = HashSet::new();

        self.memory().retain(|key, _| {
            if matches(key) {
                removed.insert(key.clone());
                false
            } else {
                true
            }
        });

        for path in self.entry_files().await? {
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if !matches(key) {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed.insert(key.to_string());
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        Ok(removed.len())
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>, RagError> {
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    pub fn memory_len(&self) -> usize {
        self.memory().len()
    }

    pub async fn file_count(&self) -> Result<usize, RagError> {
        Ok(self.entry_files().await?.len())
    }
}

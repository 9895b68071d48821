use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

/// Which `DocumentIndex` implementation answers queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Chunk files ranked by the local keyword scorer.
    Heuristic,
    /// Chunk files filtered in batches by the completion provider.
    #[default]
    Remote,
    /// Embeddings with brute-force cosine search.
    Vector,
}

impl FromStr for RetrievalMode {
    type Err = RagError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(RetrievalMode::Heuristic),
            "remote" => Ok(RetrievalMode::Remote),
            "vector" => Ok(RetrievalMode::Vector),
            other => Err(RagError::InvalidConfig(format!(
                "unknown retrieval mode: {other}"
            ))),
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetrievalMode::Heuristic => "heuristic",
            RetrievalMode::Remote => "remote",
            RetrievalMode::Vector => "vector",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub heuristic: HeuristicSettings,
    pub remote: RemoteSettings,
    pub vector: VectorSettings,
    pub groq: GroqSettings,
    pub embedding: EmbeddingSettings,
    pub answer: AnswerSettings,
}

impl Settings {
    /// Chunk length used when a document is added under `mode`.
    pub fn chunk_max_length(&self, mode: RetrievalMode) -> usize {
        match mode {
            RetrievalMode::Heuristic => self.heuristic.chunk_max_length,
            RetrievalMode::Remote => self.remote.chunk_max_length,
            RetrievalMode::Vector => self.vector.chunk_max_length,
        }
    }

    pub fn top_k(&self, mode: RetrievalMode) -> usize {
        match mode {
            RetrievalMode::Heuristic => self.heuristic.top_k,
            RetrievalMode::Remote => self.remote.top_k,
            RetrievalMode::Vector => self.vector.top_k,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub mode: RetrievalMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicSettings {
    pub chunk_max_length: usize,
    pub top_k: usize,
    pub min_score: f64,
}

impl Default for HeuristicSettings {
    fn default() -> Self {
        Self {
            chunk_max_length: 150,
            top_k: 5,
            min_score: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub chunk_max_length: usize,
    pub top_k: usize,
    pub batch_size: usize,
    pub snippet_chars: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            chunk_max_length: 1500,
            top_k: 3,
            batch_size: 3,
            snippet_chars: 300,
            max_tokens: 30,
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorSettings {
    pub chunk_max_length: usize,
    pub top_k: usize,
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self {
            chunk_max_length: 500,
            top_k: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub min_interval_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub default_retry_after_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for GroqSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key: None,
            min_interval_ms: 2000,
            max_attempts: 3,
            backoff_ms: 2000,
            default_retry_after_secs: 5,
            request_timeout_secs: 60,
        }
    }
}

impl GroqSettings {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            api_key: None,
            request_timeout_secs: 60,
        }
    }
}

impl EmbeddingSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.1,
        }
    }
}

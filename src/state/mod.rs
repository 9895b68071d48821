use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::config::{AppPaths, ConfigService, RetrievalMode, Settings};
use crate::core::errors::RagError;
use crate::llm::{CompletionClient, GroqProvider, HuggingFaceEmbedder, RateLimiter, RetryPolicy};
use crate::rag::{
    AnswerService, BatchCache, DocumentIndex, DocumentStore, IndexStatus, RemoteBatchScorer,
    VectorIndex,
};

pub mod error;

use error::InitializationError;

/// Everything a command needs, wired for one retrieval mode.
///
/// The answer step and the remote batch scorer share one `CompletionClient`
/// and therefore one rate-limit gate.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Settings,
    pub mode: RetrievalMode,
    pub limiter: Arc<RateLimiter>,
    pub index: Arc<dyn DocumentIndex>,
    pub answers: Arc<AnswerService>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub mode: RetrievalMode,
    #[serde(flatten)]
    pub index: IndexStatus,
    pub min_interval_ms: u128,
    pub last_request_at: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn initialize(mode: Option<RetrievalMode>) -> Result<Self, InitializationError> {
        Self::with_paths(Arc::new(AppPaths::new()), mode)
    }

    /// `mode` overrides `retrieval.mode` from the configuration.
    pub fn with_paths(
        paths: Arc<AppPaths>,
        mode: Option<RetrievalMode>,
    ) -> Result<Self, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config.load_settings().map_err(InitializationError::Config)?;
        let mode = mode.unwrap_or(settings.retrieval.mode);

        let limiter = Arc::new(RateLimiter::new(settings.groq.min_interval()));
        let provider =
            GroqProvider::new(&settings.groq).map_err(InitializationError::Provider)?;
        let client = CompletionClient::new(
            Arc::new(provider),
            limiter.clone(),
            RetryPolicy::from(&settings.groq),
        );
        let cache = Arc::new(BatchCache::new(paths.cache_dir.clone()));

        let index: Arc<dyn DocumentIndex> = match mode {
            RetrievalMode::Heuristic => Arc::new(DocumentStore::heuristic(
                paths.data_dir.clone(),
                cache,
                settings.chunk_max_length(mode),
                settings.heuristic.min_score,
            )),
            RetrievalMode::Remote => {
                let scorer =
                    RemoteBatchScorer::new(client.clone(), cache, settings.remote.clone());
                Arc::new(DocumentStore::remote(
                    paths.data_dir.clone(),
                    scorer,
                    settings.chunk_max_length(mode),
                ))
            }
            RetrievalMode::Vector => {
                let embedder = HuggingFaceEmbedder::new(&settings.embedding)
                    .map_err(InitializationError::Provider)?;
                Arc::new(VectorIndex::new(
                    paths.vector_dir.clone(),
                    settings.chunk_max_length(mode),
                    Arc::new(embedder),
                ))
            }
        };

        let answers = Arc::new(AnswerService::new(
            index.clone(),
            client,
            settings.answer.clone(),
            settings.top_k(mode),
        ));

        tracing::debug!("Initialized {} retrieval under {}", mode, paths.user_data_dir.display());

        Ok(AppState {
            paths,
            config,
            settings,
            mode,
            limiter,
            index,
            answers,
            started_at: Utc::now(),
        })
    }

    pub fn top_k(&self) -> usize {
        self.settings.top_k(self.mode)
    }

    pub async fn status(&self) -> Result<SystemStatus, RagError> {
        Ok(SystemStatus {
            mode: self.mode,
            index: self.index.status().await?,
            min_interval_ms: self.limiter.min_interval().as_millis(),
            last_request_at: self.limiter.last_admitted(),
            started_at: self.started_at,
        })
    }
}

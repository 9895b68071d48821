use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::provider::EmbeddingProvider;
use crate::core::config::settings::EmbeddingSettings;
use crate::core::errors::RagError;

/// Hugging Face inference API, feature-extraction pipeline.
#[derive(Clone)]
pub struct HuggingFaceEmbedder {
    url: String,
    api_key: Option<String>,
    client: Client,
}

impl HuggingFaceEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(RagError::internal)?;

        Ok(Self {
            url: format!(
                "{}/{}",
                settings.base_url.trim_end_matches('/'),
                settings.model.trim_start_matches('/')
            ),
            api_key: settings.api_key.clone(),
            client,
        })
    }
}

/// The pipeline answers either a pooled vector or one vector per token.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtraction {
    Pooled(Vec<f32>),
    PerToken(Vec<Vec<f32>>),
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbedder {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                RagError::Configuration(
                    "HF_API_KEY is not set (environment or secrets.yaml embedding.api_key)"
                        .to_string(),
                )
            })?;

        let body = json!({
            "inputs": text,
            "options": { "wait_for_model": true },
        });

        let res = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(RagError::transport)?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(RagError::Provider { status, body });
        }

        let payload: FeatureExtraction = res.json().await?;
        Ok(pool(payload))
    }
}

fn pool(payload: FeatureExtraction) -> Vec<f32> {
    match payload {
        FeatureExtraction::Pooled(vector) => vector,
        FeatureExtraction::PerToken(tokens) => mean_pool(&tokens),
    }
}

fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };

    let dim = first.len();
    let mut out = vec![0.0f32; dim];
    for row in tokens {
        for (acc, value) in out.iter_mut().zip(row.iter()) {
            *acc += value;
        }
    }
    let count = tokens.len() as f32;
    for value in &mut out {
        *value /= count;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_reply_passes_through() {
        let payload: FeatureExtraction = serde_json::from_str("[0.5, -1.0, 2.0]").unwrap();
        assert_eq!(pool(payload), vec![0.5, -1.0, 2.0]);
    }

    #[test]
    fn per_token_reply_is_mean_pooled() {
        let payload: FeatureExtraction =
            serde_json::from_str("[[1.0, 2.0], [3.0, 4.0], [5.0, 0.0]]").unwrap();
        assert_eq!(pool(payload), vec![3.0, 2.0]);
    }

    #[test]
    fn empty_token_matrix_yields_empty_vector() {
        assert!(mean_pool(&[]).is_empty());
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let settings = EmbeddingSettings {
            base_url: format!("http://{addr}"),
            model: "mini".to_string(),
            api_key: Some("hf_test".to_string()),
            request_timeout_secs: 1,
        };
        let embedder = HuggingFaceEmbedder::new(&settings).unwrap();

        let start = std::time::Instant::now();
        let err = embedder.embed("texto").await.unwrap_err();

        assert!(matches!(err, RagError::Transport(_)), "{err}");
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
        server.abort();
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let embedder = HuggingFaceEmbedder::new(&EmbeddingSettings::default()).unwrap();
        let err = embedder.embed("texto").await.unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));
    }
}

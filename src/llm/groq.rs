use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::provider::CompletionProvider;
use super::types::{CompletionOutcome, CompletionRequest};
use crate::core::config::settings::GroqSettings;
use crate::core::errors::RagError;

/// Groq's OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct GroqProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    default_retry_after: Duration,
    client: Client,
}

impl GroqProvider {
    pub fn new(settings: &GroqSettings) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(RagError::internal)?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            default_retry_after: settings.default_retry_after(),
            client,
        })
    }

    fn api_key(&self) -> Result<&str, RagError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                RagError::Configuration(
                    "GROQ_API_KEY is not set (environment or secrets.yaml groq.api_key)"
                        .to_string(),
                )
            })
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    retry_after: Option<f64>,
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionOutcome, RagError> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(RagError::transport)?;

        let status = res.status().as_u16();
        let retry_after_header = res
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = res.text().await.map_err(RagError::transport)?;

        Ok(decode_completion(
            status,
            retry_after_header.as_deref(),
            &text,
            self.default_retry_after,
        ))
    }
}

/// Turns a raw HTTP reply into a `CompletionOutcome`.
///
/// A 429 takes its delay from `error.retry_after` in the body, then from the
/// `Retry-After` header, then falls back to `default_retry_after`.
pub(crate) fn decode_completion(
    status: u16,
    retry_after_header: Option<&str>,
    body: &str,
    default_retry_after: Duration,
) -> CompletionOutcome {
    match status {
        200..=299 => match serde_json::from_str::<ChatCompletionResponse>(body) {
            Ok(parsed) => CompletionOutcome::Success {
                text: parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            },
            Err(err) => CompletionOutcome::Failure {
                status,
                body: format!("undecodable completion payload: {err}"),
            },
        },
        429 => {
            let from_body = serde_json::from_str::<ErrorEnvelope>(body)
                .ok()
                .and_then(|envelope| envelope.error)
                .and_then(|detail| detail.retry_after);
            let from_header = retry_after_header.and_then(|value| value.trim().parse::<f64>().ok());

            let retry_after = from_body
                .or(from_header)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .unwrap_or(default_retry_after);

            CompletionOutcome::RateLimited { retry_after }
        }
        _ => CompletionOutcome::Failure {
            status,
            body: body.to_string(),
        },
    }
}

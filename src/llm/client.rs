use std::sync::Arc;
use std::time::Duration;

use super::provider::CompletionProvider;
use super::rate_limit::RateLimiter;
use super::types::{CompletionOutcome, CompletionRequest};
use crate::core::config::settings::GroqSettings;
use crate::core::errors::RagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts that may fail before the error is returned. Rate-limit waits
    /// are not attempts.
    pub max_attempts: u32,
    /// Linear backoff unit: attempt `n` waits `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(2000),
        }
    }
}

impl From<&GroqSettings> for RetryPolicy {
    fn from(settings: &GroqSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            backoff: settings.backoff(),
        }
    }
}

/// Serialized, retrying front door to a `CompletionProvider`.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            limiter,
            policy,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Returns the model's reply, trimmed.
    pub async fn call(&self, request: &CompletionRequest) -> Result<String, RagError> {
        let mut attempt: u32 = 1;

        loop {
            self.limiter.acquire().await;

            let err = match self.provider.complete(request).await {
                Ok(CompletionOutcome::Success { text }) => return Ok(text.trim().to_string()),
                Ok(CompletionOutcome::RateLimited { retry_after }) => {
                    tracing::warn!(
                        "{} rate limit hit, waiting {:.1}s",
                        self.provider.name(),
                        retry_after.as_secs_f64()
                    );
                    tokio::time::sleep(retry_after).await;
                    continue;
                }
                Ok(CompletionOutcome::Failure { status, body }) => {
                    RagError::Provider { status, body }
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => err,
            };

            tracing::warn!(
                "{} attempt {}/{} failed: {}",
                self.provider.name(),
                attempt,
                self.policy.max_attempts,
                err
            );

            if attempt >= self.policy.max_attempts {
                return Err(err);
            }

            tokio::time::sleep(self.policy.backoff * attempt).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Replays canned outcomes; once the script runs out every call succeeds
    /// with `fallback`.
    pub struct ScriptedProvider {
        script: Mutex<VecDeque<Result<CompletionOutcome, RagError>>>,
        fallback: String,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn new(script: Vec<Result<CompletionOutcome, RagError>>) -> Self {
            Self::with_fallback(script, "nenhum")
        }

        pub fn with_fallback(
            script: Vec<Result<CompletionOutcome, RagError>>,
            fallback: &str,
        ) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback: fallback.to_string(),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(replies: &[&str]) -> Self {
            Self::new(replies.iter().map(|reply| Ok(success(reply))).collect())
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    pub fn success(text: &str) -> CompletionOutcome {
        CompletionOutcome::Success {
            text: text.to_string(),
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionOutcome, RagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = request.messages.last() {
                self.prompts.lock().unwrap().push(message.content.clone());
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(success(&self.fallback)))
        }
    }

    pub fn fast_client(provider: Arc<ScriptedProvider>) -> CompletionClient {
        CompletionClient::new(
            provider,
            Arc::new(RateLimiter::new(Duration::ZERO)),
            RetryPolicy {
                max_attempts: 3,
                backoff: Duration::from_millis(5),
            },
        )
    }
}

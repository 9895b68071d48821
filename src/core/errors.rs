use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid tenant id: {0:?}")]
    InvalidTenant(String),
    #[error("provider error {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl RagError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        RagError::Internal(err.to_string())
    }

    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        RagError::Transport(err.to_string())
    }

    /// Errors the retrying client returns without another attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RagError::Configuration(_) | RagError::InvalidConfig(_) | RagError::InvalidTenant(_)
        )
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => RagError::Provider {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => RagError::Transport(err.to_string()),
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("upstream error from {endpoint}: {message}")]
    Upstream {
        endpoint: String,
        message: String,
        status: Option<u16>,
    },

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid prompt file: {0}")]
    Prompts(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("generation task failed: {0}")]
    TaskFailed(String),
}

impl BenchError {
    /// Endpoint URL for errors raised while talking to one.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Upstream { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    /// Short label used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Upstream { .. } => "upstream",
            Self::SchemaParse(_) => "parse_error",
            Self::Request(_) => "transport",
            Self::Config(_) => "config",
            Self::Prompts(_) => "prompts",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::TaskFailed(_) => "task_failed",
        }
    }
}

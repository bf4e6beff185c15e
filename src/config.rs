use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::error::BenchError;
use crate::runner::sanitize_model_id;

/// Environment variable that supplies (or overrides) the endpoint credential.
pub const API_KEY_ENV: &str = "STORYBENCH_API_KEY";

/// Hour-scale ceiling: long generations must never be cut off by the client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3600;

pub const DEFAULT_MAX_TOKENS: u64 = 4096;

/// On-disk shape. Accepts the original tool's key names as aliases.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    words_to_check: Vec<String>,
    models: Vec<String>,
    #[serde(alias = "llm_urls")]
    endpoints: Vec<String>,
    #[serde(alias = "max_workers_per_url")]
    workers_per_endpoint: Vec<usize>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    max_tokens: u64,
    #[serde(default)]
    stop: Option<StopSequences>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
}

/// `stop` may be written as a single string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StopSequences {
    One(String),
    Many(Vec<String>),
}

impl From<StopSequences> for Vec<String> {
    fn from(s: StopSequences) -> Self {
        match s {
            StopSequences::One(one) => vec![one],
            StopSequences::Many(many) => many,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_tokens() -> u64 {
    DEFAULT_MAX_TOKENS
}

/// Validated run configuration. Read-only once loaded.
#[derive(Clone)]
pub struct Config {
    pub words_to_check: Vec<String>,
    pub models: Vec<String>,
    pub endpoints: Vec<String>,
    /// Same length as `endpoints`; every entry is at least 1.
    pub workers_per_endpoint: Vec<usize>,
    pub api_key: String,
    pub request_timeout: Duration,
    pub max_tokens: u64,
    pub stop: Vec<String>,
    pub output_dir: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("words_to_check", &self.words_to_check)
            .field("models", &self.models)
            .field("endpoints", &self.endpoints)
            .field("workers_per_endpoint", &self.workers_per_endpoint)
            .field("api_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .field("max_tokens", &self.max_tokens)
            .field("stop", &self.stop)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

/// Serialization format of a config file, picked from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

impl Config {
    /// Load, apply the environment credential, and validate.
    pub fn from_path(path: &Path) -> Result<Self, BenchError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let env_key = env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        Self::parse(&raw, ConfigFormat::from_path(path), env_key)
    }

    /// Parse config text. `api_key_override` wins over the file's `api_key`.
    pub fn parse(
        raw: &str,
        format: ConfigFormat,
        api_key_override: Option<String>,
    ) -> Result<Self, BenchError> {
        let file: ConfigFile = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(raw)
                .map_err(|e| BenchError::Config(format!("unable to parse YAML: {e}")))?,
            ConfigFormat::Toml => toml::from_str(raw)
                .map_err(|e| BenchError::Config(format!("unable to parse TOML: {e}")))?,
        };

        let api_key = api_key_override
            .or(file.api_key)
            .ok_or_else(|| {
                BenchError::Config(format!("api_key missing (set it in the file or {API_KEY_ENV})"))
            })?;

        let config = Config {
            words_to_check: file.words_to_check,
            models: file.models,
            endpoints: file.endpoints,
            workers_per_endpoint: file.workers_per_endpoint,
            api_key,
            request_timeout: Duration::from_secs(file.request_timeout_secs),
            max_tokens: file.max_tokens,
            stop: file.stop.map(Vec::<String>::from).unwrap_or_default(),
            output_dir: file.output_dir.unwrap_or_else(|| PathBuf::from(".")),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.endpoints.is_empty() {
            return Err(BenchError::Config("at least one endpoint is required".into()));
        }
        if self.workers_per_endpoint.len() != self.endpoints.len() {
            return Err(BenchError::Config(format!(
                "workers_per_endpoint has {} entries but there are {} endpoints",
                self.workers_per_endpoint.len(),
                self.endpoints.len()
            )));
        }
        if let Some(idx) = self.workers_per_endpoint.iter().position(|w| *w == 0) {
            return Err(BenchError::Config(format!(
                "endpoint {idx} ({}) has zero workers",
                self.endpoints[idx]
            )));
        }
        if let Some(idx) = self
            .workers_per_endpoint
            .iter()
            .position(|w| *w > Semaphore::MAX_PERMITS)
        {
            return Err(BenchError::Config(format!(
                "endpoint {idx} ({}) has {} workers (max {})",
                self.endpoints[idx],
                self.workers_per_endpoint[idx],
                Semaphore::MAX_PERMITS
            )));
        }
        if self.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(BenchError::Config("endpoint URL must not be empty".into()));
        }
        if self.models.is_empty() {
            return Err(BenchError::Config("at least one model is required".into()));
        }
        if self.models.iter().any(|m| m.trim().is_empty()) {
            return Err(BenchError::Config("model id must not be empty".into()));
        }
        // Output files are named after the sanitized id, so stems must be unique.
        for (i, model) in self.models.iter().enumerate() {
            let stem = sanitize_model_id(model);
            if let Some(other) = self.models[..i]
                .iter()
                .find(|m| sanitize_model_id(m) == stem)
            {
                return Err(BenchError::Config(format!(
                    "models {other:?} and {model:?} would share output files ({stem}_*)"
                )));
            }
        }
        if self.words_to_check.iter().any(|w| w.is_empty()) {
            return Err(BenchError::Config("words_to_check contains an empty word".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(BenchError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Restrict the run to `selected` models, keeping config order.
    /// An empty selection keeps every model.
    pub fn select_models(&mut self, selected: &[String]) -> Result<(), BenchError> {
        if selected.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = selected.iter().find(|s| !self.models.contains(s)) {
            return Err(BenchError::Config(format!("model not configured: {unknown}")));
        }
        self.models.retain(|m| selected.contains(m));
        Ok(())
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

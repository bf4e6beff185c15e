use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;

use crate::dispatch::{Generate, GenerationRequest, GenerationResult};
use crate::error::BenchError;

const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// Well-known sub-path appended to every endpoint base URL.
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub const SYSTEM_PROMPT: &str = "You are a creative writer tasked with writing new and interesting stories based on the writing prompt given to you.";

pub const USER_PROMPT_PREFIX: &str =
    "You are given the following writing prompt, write a story based on the prompt. The prompt is:\n";

/// Credential and sampling settings threaded into every request.
#[derive(Clone)]
pub struct ClientSettings {
    pub api_key: String,
    pub max_tokens: u64,
    pub stop: Vec<String>,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("api_key", &"[REDACTED]")
            .field("max_tokens", &self.max_tokens)
            .field("stop", &self.stop)
            .finish()
    }
}

pub struct GenerationClient {
    client: Client,
    settings: ClientSettings,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Full completions URL for an endpoint base. Bases that already carry
/// the path are used unchanged.
pub fn completions_url(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(COMPLETIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{COMPLETIONS_PATH}")
    }
}

/// Request body: greedy decoding, neutral repetition penalty, two-part message list.
pub fn request_body(model: &str, prompt: &str, settings: &ClientSettings) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "temperature": 0,
        "repetition_penalty": 1,
        "max_tokens": settings.max_tokens,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": format!("{USER_PROMPT_PREFIX}{prompt}")},
        ],
    });
    if !settings.stop.is_empty() {
        body["stop"] = serde_json::json!(settings.stop);
    }
    body
}

impl GenerationClient {
    pub fn new(settings: ClientSettings) -> Result<Self, BenchError> {
        // No separate connect cap: the per-request timeout is the only ceiling.
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self { client, settings })
    }

    pub async fn query_endpoint(
        &self,
        req: &GenerationRequest,
    ) -> Result<GenerationResult, BenchError> {
        let start = Instant::now();
        let url = completions_url(&req.endpoint);
        let body = request_body(&req.model, &req.prompt, &self.settings);
        let timeout_ms = req.timeout.as_millis() as u64;

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .header("Content-Type", "application/json")
            .timeout(req.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout_ms))?;

        let status = response.status();

        // Only 200 counts; other 2xx codes are protocol violations too.
        // Cap error body reads to MAX_RESPONSE_BYTES.
        if status != reqwest::StatusCode::OK {
            let error_bytes = response.bytes().await.unwrap_or_default();
            let truncated = &error_bytes[..error_bytes.len().min(MAX_RESPONSE_BYTES)];
            let text = String::from_utf8_lossy(truncated);
            return Err(BenchError::Upstream {
                endpoint: req.endpoint.clone(),
                message: format!("{status}: {text}"),
                status: Some(status.as_u16()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, timeout_ms))?;

        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(BenchError::Upstream {
                endpoint: req.endpoint.clone(),
                message: format!(
                    "response too large: {} bytes (max {MAX_RESPONSE_BYTES})",
                    bytes.len()
                ),
                status: None,
            });
        }

        let text = extract_content(&bytes)?;
        let latency_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            endpoint = %req.endpoint,
            prompt_index = req.prompt_index,
            latency_ms,
            "generation complete"
        );

        Ok(GenerationResult {
            text,
            model: req.model.clone(),
            endpoint: req.endpoint.clone(),
            latency_ms,
        })
    }
}

impl Generate for GenerationClient {
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationResult, BenchError> {
        self.query_endpoint(req).await
    }
}

/// Pull the first choice's message content out of a completion body.
pub fn extract_content(bytes: &[u8]) -> Result<String, BenchError> {
    let completion: ChatCompletion = serde_json::from_slice(bytes)
        .map_err(|e| BenchError::SchemaParse(format!("failed to parse response: {e}")))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| BenchError::SchemaParse("empty choices or null content".to_string()))
}

fn transport_error(e: reqwest::Error, timeout_ms: u64) -> BenchError {
    if e.is_timeout() {
        BenchError::Timeout(timeout_ms)
    } else {
        BenchError::Request(e)
    }
}

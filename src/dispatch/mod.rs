pub mod http;
pub mod pool;
pub mod progress;

use std::future::Future;
use std::time::Duration;

use crate::error::BenchError;

/// One prompt bound for one endpoint. Immutable once built.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    /// Position of the prompt in the prompt set.
    pub prompt_index: usize,
    pub endpoint_index: usize,
    /// Base URL of the target endpoint.
    pub endpoint: String,
    pub timeout: Duration,
}

/// Successful generation. Failures travel as `BenchError`.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub model: String,
    pub endpoint: String,
    pub latency_ms: u64,
}

/// Static round-robin: prompt `i` goes to endpoint `i mod endpoint_count`.
pub fn assign_endpoint(prompt_index: usize, endpoint_count: usize) -> usize {
    debug_assert!(endpoint_count > 0, "endpoint_count must be positive");
    prompt_index % endpoint_count
}

/// Seam between the dispatcher and whatever performs a single generation.
/// Implementations make exactly one attempt per call.
pub trait Generate: Send + Sync + 'static {
    fn generate(
        &self,
        req: &GenerationRequest,
    ) -> impl Future<Output = Result<GenerationResult, BenchError>> + Send;
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{Id as TaskId, JoinSet};

use crate::batch::{ResponseBatch, ResponseEntry};
use crate::dispatch::progress::{Progress, ProgressSnapshot};
use crate::dispatch::{Generate, GenerationRequest, GenerationResult, assign_endpoint};
use crate::error::BenchError;
use crate::prompts::PromptSet;

/// One semaphore per endpoint, sized by that endpoint's worker count.
/// Bounds in-flight requests per endpoint; pools never share permits.
pub struct WorkerPools {
    pools: Vec<Arc<Semaphore>>,
}

impl WorkerPools {
    pub fn new(workers_per_endpoint: &[usize]) -> Self {
        Self {
            pools: workers_per_endpoint
                .iter()
                .map(|w| Arc::new(Semaphore::new(*w)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Free permits on one endpoint's pool (for testing and logs).
    pub fn available_permits(&self, endpoint_index: usize) -> usize {
        self.pools
            .get(endpoint_index)
            .map_or(0, |p| p.available_permits())
    }

    fn pool(&self, endpoint_index: usize) -> Arc<Semaphore> {
        self.pools[endpoint_index].clone()
    }
}

/// Fans one model's prompts out across the endpoint pools and collects
/// successful responses in completion order.
pub struct Dispatcher<G> {
    generator: Arc<G>,
    endpoints: Vec<String>,
    pools: WorkerPools,
    timeout: Duration,
}

type TaskOutput = (GenerationRequest, Result<GenerationResult, BenchError>);

impl<G: Generate> Dispatcher<G> {
    pub fn new(
        generator: G,
        endpoints: Vec<String>,
        workers_per_endpoint: &[usize],
        timeout: Duration,
    ) -> Result<Self, BenchError> {
        if endpoints.is_empty() {
            return Err(BenchError::Config("dispatcher needs at least one endpoint".into()));
        }
        if endpoints.len() != workers_per_endpoint.len() {
            return Err(BenchError::Config(format!(
                "{} endpoints but {} worker counts",
                endpoints.len(),
                workers_per_endpoint.len()
            )));
        }
        if let Some(w) = workers_per_endpoint
            .iter()
            .find(|w| **w == 0 || **w > Semaphore::MAX_PERMITS)
        {
            return Err(BenchError::Config(format!(
                "worker count {w} out of range (1..={})",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(Self {
            generator: Arc::new(generator),
            endpoints,
            pools: WorkerPools::new(workers_per_endpoint),
            timeout,
        })
    }

    pub fn pools(&self) -> &WorkerPools {
        &self.pools
    }

    /// Build every request for `model` with its round-robin endpoint.
    pub fn plan(&self, model: &str, prompts: &PromptSet) -> Vec<GenerationRequest> {
        prompts
            .iter()
            .enumerate()
            .map(|(prompt_index, prompt)| {
                let endpoint_index = assign_endpoint(prompt_index, self.endpoints.len());
                GenerationRequest {
                    model: model.to_string(),
                    prompt: prompt.to_string(),
                    prompt_index,
                    endpoint_index,
                    endpoint: self.endpoints[endpoint_index].clone(),
                    timeout: self.timeout,
                }
            })
            .collect()
    }

    /// Run one model's batch, logging progress after each completion.
    pub async fn run_model(
        &self,
        model: &str,
        prompts: &PromptSet,
    ) -> Result<ResponseBatch, BenchError> {
        self.run_model_with_progress(model, prompts, |snapshot| {
            tracing::info!(
                model,
                completed = snapshot.completed,
                total = snapshot.total,
                "{snapshot}"
            );
        })
        .await
    }

    /// Run one model's batch. All requests are submitted before any result
    /// is awaited. The first failure aborts the rest and is returned.
    pub async fn run_model_with_progress<F>(
        &self,
        model: &str,
        prompts: &PromptSet,
        mut on_progress: F,
    ) -> Result<ResponseBatch, BenchError>
    where
        F: FnMut(&ProgressSnapshot),
    {
        let requests = self.plan(model, prompts);
        let mut batch = ResponseBatch::with_capacity(requests.len());
        if requests.is_empty() {
            tracing::info!(model, "no prompts to dispatch");
            return Ok(batch);
        }

        let mut progress = Progress::new(requests.len());
        let mut set: JoinSet<TaskOutput> = JoinSet::new();
        // Task ID → prompt index, for panic attribution
        let mut task_prompt_map: HashMap<TaskId, usize> = HashMap::new();

        for req in requests {
            let generator = self.generator.clone();
            let pool = self.pools.pool(req.endpoint_index);
            let prompt_index = req.prompt_index;

            let abort_handle = set.spawn(async move {
                let result = match pool.acquire_owned().await {
                    Ok(_permit) => generator.generate(&req).await,
                    Err(_) => Err(BenchError::TaskFailed("worker pool closed".to_string())),
                };
                (req, result)
            });
            task_prompt_map.insert(abort_handle.id(), prompt_index);
        }

        tracing::info!(
            model,
            prompts = progress.total(),
            endpoints = self.endpoints.len(),
            "dispatched batch"
        );

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((req, Ok(result))) => {
                    batch.push(ResponseEntry {
                        prompt_index: req.prompt_index,
                        prompt: req.prompt,
                        response: result.text,
                    });
                    let snapshot = progress.record();
                    on_progress(&snapshot);
                }
                Ok((req, Err(e))) => {
                    tracing::error!(
                        model,
                        endpoint = e.endpoint().unwrap_or(req.endpoint.as_str()),
                        prompt_index = req.prompt_index,
                        kind = e.kind(),
                        "generation failed: {e}"
                    );
                    set.abort_all();
                    return Err(e);
                }
                Err(join_err) => {
                    let prompt_index = task_prompt_map.get(&join_err.id()).copied();
                    tracing::error!(model, ?prompt_index, "generation task failed: {join_err}");
                    set.abort_all();
                    return Err(BenchError::TaskFailed(match prompt_index {
                        Some(i) => format!("prompt {i}: {join_err}"),
                        None => join_err.to_string(),
                    }));
                }
            }
        }

        debug_assert_eq!(batch.len(), progress.completed());
        Ok(batch)
    }
}

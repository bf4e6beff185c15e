use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::Config;
use crate::dispatch::Generate;
use crate::dispatch::http::{ClientSettings, GenerationClient};
use crate::dispatch::pool::Dispatcher;
use crate::error::BenchError;
use crate::prompts::PromptSet;
use crate::report::Report;

/// Where one model's artifacts land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub responses: PathBuf,
    pub report: PathBuf,
}

/// Model ids like `meta/llama-3` are not valid file names as-is.
pub fn sanitize_model_id(model: &str) -> String {
    model
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect()
}

pub fn output_paths(output_dir: &Path, model: &str) -> OutputPaths {
    let stem = sanitize_model_id(model);
    OutputPaths {
        responses: output_dir.join(format!("{stem}_responses.json")),
        report: output_dir.join(format!("{stem}_report.txt")),
    }
}

#[derive(Debug, Clone)]
pub struct ModelOutcome {
    pub model: String,
    pub responses: usize,
    pub report: Report,
    pub paths: OutputPaths,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub models: Vec<ModelOutcome>,
}

/// Runs every configured model strictly one after another.
pub struct Runner<G> {
    config: Config,
    dispatcher: Dispatcher<G>,
}

impl Runner<GenerationClient> {
    pub fn from_config(config: Config) -> Result<Self, BenchError> {
        let client = GenerationClient::new(ClientSettings {
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
            stop: config.stop.clone(),
        })?;
        Self::with_generator(config, client)
    }
}

impl<G: Generate> Runner<G> {
    pub fn with_generator(config: Config, generator: G) -> Result<Self, BenchError> {
        let dispatcher = Dispatcher::new(
            generator,
            config.endpoints.clone(),
            &config.workers_per_endpoint,
            config.request_timeout,
        )?;
        Ok(Self { config, dispatcher })
    }

    /// Stops at the first failing model; later models never start.
    pub async fn run(&self, prompts: &PromptSet) -> Result<RunSummary, BenchError> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let mut summary = RunSummary::default();
        for model in &self.config.models {
            let outcome = self.run_model(model, prompts).await?;
            summary.models.push(outcome);
        }
        Ok(summary)
    }

    /// Dispatch, then persist responses, then write and print the report.
    /// Nothing is written for a model whose dispatch fails.
    pub async fn run_model(
        &self,
        model: &str,
        prompts: &PromptSet,
    ) -> Result<ModelOutcome, BenchError> {
        let start = Instant::now();
        tracing::info!(model, prompts = prompts.len(), "starting model");

        let batch = self.dispatcher.run_model(model, prompts).await?;

        let paths = output_paths(&self.config.output_dir, model);
        batch.write_json(&paths.responses).await?;

        let report = Report::compute(batch.texts(), &self.config.words_to_check);
        report.write_to(&paths.report).await?;
        print!("{}", report.render_for_model(model));

        tracing::info!(
            model,
            responses = batch.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            report = %paths.report.display(),
            "model complete"
        );

        Ok(ModelOutcome {
            model: model.to_string(),
            responses: batch.len(),
            report,
            paths,
        })
    }
}

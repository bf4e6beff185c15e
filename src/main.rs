use anyhow::Context;
use clap::Parser;

use storybench::cli::Cli;
use storybench::config::Config;
use storybench::prompts::PromptSet;
use storybench::runner::Runner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // A missing .env is fine; the key may live in the config file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::from_path(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    config.select_models(&cli.models)?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let prompts = PromptSet::from_path(&cli.prompts)
        .with_context(|| format!("loading prompts {}", cli.prompts.display()))?;
    tracing::info!(prompts = prompts.len(), models = config.models.len(), "testing prompts obtained");

    let runner = Runner::from_config(config)?;
    let summary = runner
        .run(&prompts)
        .await
        .inspect_err(|e| tracing::error!(kind = e.kind(), "run aborted: {e}"))?;

    tracing::info!(models = summary.models.len(), "run complete");
    Ok(())
}

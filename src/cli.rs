use std::path::PathBuf;

use clap::Parser;

/// Send a batch of writing prompts to every configured model and count
/// how often the configured words show up in the stories.
#[derive(Debug, Parser)]
#[command(name = "storybench", version)]
pub struct Cli {
    #[arg(long, default_value = "config.yml", help = "Run configuration (YAML, or TOML by extension)")]
    pub config: PathBuf,

    #[arg(long, default_value = "prompts.json", help = "JSON object of prompt id to prompt text")]
    pub prompts: PathBuf,

    #[arg(long, help = "Directory for response and report files (overrides output_dir)")]
    pub output_dir: Option<PathBuf>,

    #[arg(long = "model", help = "Only run this configured model (repeatable)")]
    pub models: Vec<String>,
}

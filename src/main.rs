use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};
use ghost2mdx::{
    Overrides,
    journal::{FileJournal, Journal},
    progress::{self, RunPhase},
};
use tracing::{error, warn};

#[derive(Parser)]
#[command(version, about = "Convert a Ghost export into MDX articles")]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every post of the export.
    Convert {
        #[clap(short, long, env = "GHOST2MDX_CONFIG", default_value = "./config.yaml")]
        config: PathBuf,
        /// Ghost export file, overriding `input.path`.
        #[clap(short, long)]
        input: Option<PathBuf>,
        /// Output directory, overriding `output.directory`.
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

async fn convert(config: PathBuf, overrides: Overrides) -> anyhow::Result<()> {
    let config = ghost2mdx::load_config(&config, overrides)
        .await
        .with_context(|| format!("load config from {}", config.display()))?;
    let journal = FileJournal::new(config.logging.file.clone());
    journal.info("Starting conversion").await;

    let reporter = progress::create_reporter();
    let result = ghost2mdx::convert(&config, &journal, reporter.as_ref()).await;
    match result {
        Ok(summary) => {
            reporter.finish();
            if let Some(reason) = summary.halted {
                warn!(%reason, "stopped at the provider's daily limit");
            }
            Ok(())
        }
        Err(e) => {
            reporter.set_phase(RunPhase::Failed(e.to_string()));
            reporter.finish();
            journal.error(&format!("Conversion failed: {e}")).await;
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let result = match opts.command {
        Command::Convert {
            config,
            input,
            output,
        } => convert(config, Overrides { input, output }).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(?e, "critical error");
            ExitCode::FAILURE
        }
    }
}

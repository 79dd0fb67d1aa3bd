use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    config::Config,
    convert::{Converter, RunSummary},
    journal::Journal,
    progress::{ProgressReporter, RunPhase},
    provider::AnyProvider,
};

pub mod config;
pub mod convert;
pub mod export;
pub mod images;
pub mod journal;
pub mod progress;
pub mod provider;
pub mod rename;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error(transparent)]
    Export(#[from] export::Error),
    #[error("failed to read instructions ({path:?}): {error}")]
    Instructions {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error(transparent)]
    Run(#[from] convert::Fatal),
}

/// Paths given on the command line that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

pub async fn load_config(path: &Path, overrides: Overrides) -> Result<Config, Error> {
    let mut config = Config::load(path).await?;
    config.apply_overrides(overrides.input, overrides.output);
    config.validate()?;
    Ok(config)
}

/// Read the export, prime the configured provider and convert every post.
pub async fn convert<J: Journal>(
    config: &Config,
    journal: &J,
    reporter: &dyn ProgressReporter,
) -> Result<RunSummary, Error> {
    reporter.set_phase(RunPhase::ReadingExport);
    let posts = export::load(&config.input.path).await?;
    info!(count = posts.len(), "loaded Ghost export");

    let path = &config.ai_service.instructions;
    let instructions =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|error| Error::Instructions {
                path: path.clone(),
                error,
            })?;

    let provider = AnyProvider::new(config.ai_service.settings()?);
    let converter = Converter::new(config, &provider, journal, reporter)?;
    Ok(converter.run(&posts, &instructions).await?)
}

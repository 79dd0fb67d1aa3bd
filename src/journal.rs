//! Run journal.
//!
//! The journal is the append-only record of one conversion run. It is passed
//! explicitly to every stage instead of living in a global, and every line
//! written through the leveled helpers is mirrored to the console via
//! `tracing`.

use std::{path::PathBuf, sync::Mutex};

use chrono::{SecondsFormat, Utc};
use tokio::io::AsyncWriteExt as _;
use tracing::{error, info, warn};

pub trait Journal {
    /// Append one message to the run log.
    fn append(&self, message: &str) -> impl Future<Output = ()>;

    fn info(&self, message: &str) -> impl Future<Output = ()> {
        info!("{message}");
        self.append(message)
    }

    fn warn(&self, message: &str) -> impl Future<Output = ()> {
        warn!("{message}");
        self.append(message)
    }

    fn error(&self, message: &str) -> impl Future<Output = ()> {
        error!("{message}");
        self.append(message)
    }
}

impl<J: Journal> Journal for &J {
    fn append(&self, message: &str) -> impl Future<Output = ()> {
        (**self).append(message)
    }
}

/// Appends timestamped lines to the configured log file. Without a file the
/// journal only mirrors to the console.
pub struct FileJournal {
    path: Option<PathBuf>,
}

impl FileJournal {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    async fn write_line(path: &PathBuf, line: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

impl Journal for FileJournal {
    async fn append(&self, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        let line = format!(
            "{}: {message}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        if let Err(error) = Self::write_line(path, &line).await {
            warn!(%error, path = %path.display(), "failed to append to log file");
        }
    }
}

/// Keeps journal lines in memory.
#[derive(Default)]
pub struct MemoryJournal {
    lines: Mutex<Vec<String>>,
}

impl MemoryJournal {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl Journal for MemoryJournal {
    async fn append(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_owned());
        }
    }
}

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid image URL ({url}): {error}")]
    InvalidUrl { url: String, error: url::ParseError },
    #[error("failed to fetch image ({url}): {error}")]
    Fetch { url: Url, error: reqwest::Error },
    #[error("failed to fetch image ({url}): {status}")]
    Status {
        url: Url,
        status: reqwest::StatusCode,
    },
    #[error("failed to write image ({path:?}): {error}")]
    Write {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("failed to probe image dimensions ({path:?}): {error}")]
    Probe {
        path: PathBuf,
        error: image::ImageError,
    },
}

/// A remote image saved to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub url: Url,
    pub width: u32,
    pub height: u32,
}

pub struct Fetcher {
    client: reqwest::Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Download `url` to `dest`, then read its dimensions from the bytes.
    pub async fn fetch(&self, url: Url, dest: &Path) -> Result<Downloaded, Error> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|error| Error::Fetch {
                error,
                url: url.clone(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { url, status });
        }
        let body = response.bytes().await.map_err(|error| Error::Fetch {
            error,
            url: url.clone(),
        })?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| Error::Write {
                    path: parent.to_owned(),
                    error,
                })?;
        }
        tokio::fs::write(dest, &body)
            .await
            .map_err(|error| Error::Write {
                path: dest.to_owned(),
                error,
            })?;
        debug!(%url, path = %dest.display(), "downloaded image");

        let (width, height) = probe(&body)
            .inspect_err(|error| warn!(%url, %error, "downloaded file is not a readable image"))
            .map_err(|error| Error::Probe {
                path: dest.to_owned(),
                error,
            })?;
        Ok(Downloaded { url, width, height })
    }
}

pub fn probe(bytes: &[u8]) -> Result<(u32, u32), image::ImageError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
}

//! Renames downloaded images after their alt text once conversion is done.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use tracing::debug;

use crate::{config, journal::Journal};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to list output directory ({path:?}): {error}")]
    List {
        path: PathBuf,
        error: std::io::Error,
    },
}

static IMAGE_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Image\b[^>]*?/>").unwrap());
static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bsrc="([^"]*)""#).unwrap());
static ALT_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\balt="([^"]*)""#).unwrap());
static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// `"My Great Photo!"` becomes `"my-great-photo"`.
pub fn slugify(text: &str) -> String {
    let lower = html_escape::decode_html_entities(text).to_lowercase();
    NON_ALNUM
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_owned()
}

/// File name an image should carry, or `None` when it cannot be derived.
fn target_name(current: &str, alt: &str) -> Option<String> {
    let slug = slugify(alt);
    if slug.is_empty() {
        return None;
    }
    match Path::new(current).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => Some(format!("{slug}.{ext}")),
        None => Some(slug),
    }
}

fn replace_file_name(src: &str, name: &str) -> String {
    match src.rfind('/') {
        Some(index) => format!("{}{name}", &src[..=index]),
        None => name.to_owned(),
    }
}

/// Rename images referenced by every artifact in `output_dir`.
///
/// Returns the number of files renamed. Per-file problems are journaled and
/// skipped.
pub async fn rename_images<J: Journal>(
    settings: &config::Images,
    output_dir: &Path,
    journal: &J,
) -> Result<usize, Error> {
    let list_error = |error| Error::List {
        path: output_dir.to_owned(),
        error,
    };
    let mut entries = tokio::fs::read_dir(output_dir).await.map_err(list_error)?;
    let mut artifacts = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "mdx") {
            artifacts.push(path);
        }
    }
    artifacts.sort();

    let mut renamed = 0;
    for artifact in artifacts {
        renamed += rename_in_artifact(settings, &artifact, journal).await;
    }
    journal
        .info(&format!("Image renaming completed. Renamed {renamed} files."))
        .await;
    Ok(renamed)
}

async fn rename_in_artifact<J: Journal>(
    settings: &config::Images,
    artifact: &Path,
    journal: &J,
) -> usize {
    let content = match tokio::fs::read_to_string(artifact).await {
        Ok(content) => content,
        Err(error) => {
            journal
                .error(&format!("Failed to read {}: {error}", artifact.display()))
                .await;
            return 0;
        }
    };
    let Some(slug) = artifact.file_stem().and_then(|stem| stem.to_str()) else {
        return 0;
    };
    let image_dir = settings.output_directory.join(slug);

    // Same image may appear twice, e.g. in the body and in the gallery.
    let mut done: HashMap<String, String> = HashMap::new();
    let mut renamed = 0;
    let mut rewritten = String::with_capacity(content.len());
    let mut cursor = 0;

    for tag in IMAGE_COMPONENT.find_iter(&content) {
        let text = tag.as_str();
        let (Some(src), Some(alt)) = (SRC_ATTR.captures(text), ALT_ATTR.captures(text)) else {
            continue;
        };
        let (Some(src), Some(alt)) = (src.get(1), alt.get(1)) else {
            continue;
        };

        let new_src = if let Some(new_src) = done.get(src.as_str()) {
            new_src.clone()
        } else {
            let current = src.as_str().rsplit('/').next().unwrap_or_default();
            let Some(name) = target_name(current, alt.as_str()) else {
                continue;
            };
            if name == current {
                continue;
            }
            let from = image_dir.join(current);
            let to = image_dir.join(&name);
            if !tokio::fs::try_exists(&from).await.unwrap_or(false) {
                journal
                    .warn(&format!("File not found, skipping rename: {}", from.display()))
                    .await;
                continue;
            }
            if tokio::fs::try_exists(&to).await.unwrap_or(false) {
                journal
                    .warn(&format!(
                        "Target already exists, skipping rename: {}",
                        to.display()
                    ))
                    .await;
                continue;
            }
            if let Err(error) = tokio::fs::rename(&from, &to).await {
                journal
                    .error(&format!(
                        "Failed to rename {} to {}: {error}",
                        from.display(),
                        to.display()
                    ))
                    .await;
                continue;
            }
            journal
                .info(&format!("Renamed {current} to {name}"))
                .await;
            renamed += 1;
            let new_src = replace_file_name(src.as_str(), &name);
            done.insert(src.as_str().to_owned(), new_src.clone());
            new_src
        };

        let start = tag.start() + src.start();
        let end = tag.start() + src.end();
        rewritten.push_str(&content[cursor..start]);
        rewritten.push_str(&new_src);
        cursor = end;
    }
    rewritten.push_str(&content[cursor..]);

    if let Err(error) = tokio::fs::write(artifact, &rewritten).await {
        journal
            .error(&format!("Failed to update {}: {error}", artifact.display()))
            .await;
    }
    debug!(artifact = %artifact.display(), renamed, "renamed images");
    renamed
}

//! Image materialization for one post.
//!
//! Every `<img>` in the post body is downloaded next to the post's other
//! images, measured, and swapped for an `<Image />` component. Images that
//! cannot be fetched degrade to the configured placeholder; they never fail
//! the post.

use std::{
    ops::Range,
    path::PathBuf,
    sync::LazyLock,
};

use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::{config, export::Post, journal::Journal};

pub mod fetch;

pub use fetch::Fetcher;

/// Stand-in for the blog's origin inside exported URLs.
pub const ORIGIN_TOKEN: &str = "__GHOST_URL__";

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img[^>]+src="([^">]+)"[^>]*alt="([^"]*)"[^>]*>"#).unwrap()
});

static GALLERY_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<h2>Gallery</h2>[\s\S]*?</div>\s*</div>").unwrap());

/// One `<img>` occurrence in the source markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatch<'s> {
    pub span: Range<usize>,
    pub src: &'s str,
    pub alt: &'s str,
}

/// Image occurrences in document order.
pub fn extract(html: &str) -> Vec<ImageMatch<'_>> {
    IMG_TAG
        .captures_iter(html)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            Some(ImageMatch {
                span: whole.range(),
                src: captures.get(1)?.as_str(),
                alt: captures.get(2)?.as_str(),
            })
        })
        .collect()
}

/// Where a source image ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub alt_text: String,
    pub local_path: PathBuf,
    pub site_path: String,
    pub remote_url: Url,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Processed {
    pub content: String,
    /// Sources replaced by the placeholder.
    pub removed: Vec<String>,
    /// Sources that could not be downloaded or measured.
    pub failed: Vec<String>,
}

pub fn image_tag(alt: &str, src: &str, width: u32, height: u32) -> String {
    format!(r#"<Image alt="{alt}" src="{src}" width={{{width}}} height={{{height}}} />"#)
}

pub fn gallery(tags: &[String]) -> String {
    let cells = tags
        .iter()
        .map(|tag| {
            format!(
                "\n  <div className=\"my-1 px-2 w-full overflow-hidden xl:my-1 xl:px-2 xl:w-1/2\">\n    {tag}\n  </div>"
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "\n## Gallery\n\n<div className=\"flex flex-wrap -mx-2 overflow-hidden xl:-mx-2\">\n  {cells}\n</div>\n"
    )
}

/// Replace the origin token with the real origin in every occurrence.
pub fn substitute_origin(text: &str, origin: &Url) -> String {
    text.replace(ORIGIN_TOKEN, origin.as_str().trim_end_matches('/'))
}

fn file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("image")
        .to_owned()
}

pub struct Pipeline<'a> {
    settings: &'a config::Images,
    origin: &'a Url,
    fetcher: &'a Fetcher,
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a config::Images, origin: &'a Url, fetcher: &'a Fetcher) -> Self {
        Self {
            settings,
            origin,
            fetcher,
        }
    }

    fn locate(&self, slug: &str, src: &str, alt: &str) -> Result<ImageReference, fetch::Error> {
        let resolved = substitute_origin(src, self.origin);
        let url = self
            .origin
            .join(&resolved)
            .map_err(|error| fetch::Error::InvalidUrl {
                url: resolved.clone(),
                error,
            })?;
        let name = file_name(&url);
        Ok(ImageReference {
            alt_text: alt.to_owned(),
            local_path: self.settings.output_directory.join(slug).join(&name),
            site_path: format!(
                "{}/{slug}/{name}",
                self.settings.public_prefix.trim_end_matches('/')
            ),
            remote_url: url,
        })
    }

    async fn materialize(&self, reference: &ImageReference) -> Result<String, fetch::Error> {
        let downloaded = self
            .fetcher
            .fetch(reference.remote_url.clone(), &reference.local_path)
            .await?;
        info!(url = %downloaded.url, "processed image");
        Ok(image_tag(
            &reference.alt_text,
            &reference.site_path,
            downloaded.width,
            downloaded.height,
        ))
    }

    /// Download and rewrite every image of `post`, in document order.
    pub async fn process<J: Journal>(&self, post: &Post, journal: &J) -> Processed {
        let html = post.html();
        let matches = extract(html);
        debug!(slug = %post.slug, count = matches.len(), "processing images");

        let mut content = String::with_capacity(html.len());
        let mut cursor = 0;
        let mut gallery_tags = Vec::new();
        let mut removed = Vec::new();
        let mut failed = Vec::new();

        for image in matches {
            content.push_str(&html[cursor..image.span.start]);
            cursor = image.span.end;
            let original = &html[image.span.clone()];

            let result = match self.locate(&post.slug, image.src, image.alt) {
                Ok(reference) => self.materialize(&reference).await,
                Err(error) => Err(error),
            };
            match result {
                Ok(tag) => {
                    content.push_str(&tag);
                    gallery_tags.push(tag);
                }
                Err(error) => {
                    warn!(src = image.src, %error, "failed to download or process image");
                    failed.push(image.src.to_owned());
                    if self.settings.remove_failed {
                        content.push_str(&self.settings.placeholder);
                        removed.push(image.src.to_owned());
                    } else {
                        content.push_str(original);
                    }
                }
            }
        }
        content.push_str(&html[cursor..]);

        let mut content = GALLERY_SECTION.replace_all(&content, "").into_owned();
        if gallery_tags.len() > 1 {
            content.insert_str(0, &gallery(&gallery_tags));
        }

        if !removed.is_empty() || !failed.is_empty() {
            journal.warn(&summary(&post.title, &removed, &failed)).await;
        }

        Processed {
            content,
            removed,
            failed,
        }
    }
}

fn summary(title: &str, removed: &[String], failed: &[String]) -> String {
    let list = |items: &[String]| {
        items
            .iter()
            .map(|item| format!(" - {item}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Post: {title}\nRemoved images: {}\n{}\nFailed downloads: {}\n{}",
        removed.len(),
        list(removed),
        failed.len(),
        list(failed)
    )
}

//! Conversion loop.
//!
//! Posts are converted strictly one after another:
//! resume check, images, provider transform, save. A failing post is logged
//! and skipped; only a provider-declared daily limit stops the run early.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::{
    config::Config,
    export::Post,
    images::{self, Fetcher, Pipeline},
    journal::Journal,
    progress::{PostStatus, ProgressReporter, RunPhase},
    provider::{self, Conversation, Provider, Reply, Usage},
    rename,
};

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("failed to resolve canonical URL ({url}): {error}")]
    CanonicalUrl { url: String, error: url::ParseError },
    #[error("failed to encode payload: {0}")]
    Encode(serde_json::Error),
    #[error(transparent)]
    Provider(#[from] provider::Error),
    #[error("failed to save MDX file ({path:?}): {error}")]
    Persist {
        path: PathBuf,
        error: std::io::Error,
    },
}

/// Conditions that end the run with a failure.
#[derive(Debug, thiserror::Error)]
pub enum Fatal {
    #[error(transparent)]
    Config(#[from] crate::config::Error),
    #[error("failed to send instructions: {0}")]
    Priming(provider::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Skipped,
    Saved { path: PathBuf, usage: Usage },
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub outcomes: Vec<(String, PostOutcome)>,
    pub usage: Usage,
    /// Set when the provider's daily limit stopped the run.
    pub halted: Option<String>,
}

/// What the provider receives for one post.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PreparedPost<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub date: Option<&'a str>,
    pub tags: Vec<&'a str>,
    pub content: String,
    pub feature_image: Option<String>,
    pub authors: Vec<&'a str>,
    pub draft: bool,
    pub excerpt: &'a str,
    #[serde(rename = "canonicalUrl")]
    pub canonical_url: String,
}

impl<'a> PreparedPost<'a> {
    pub fn new(post: &'a Post, content: &str, origin: &Url) -> Result<Self, PostError> {
        let relative = post
            .url
            .as_deref()
            .map(|url| images::substitute_origin(url, origin))
            .unwrap_or_else(|| format!("/{}/", post.slug));
        let canonical_url = origin
            .join(&relative)
            .map_err(|error| PostError::CanonicalUrl {
                url: relative.clone(),
                error,
            })?;
        let authors = if post.authors.is_empty() {
            vec!["default"]
        } else {
            post.authors.iter().map(|author| author.name.as_str()).collect()
        };
        Ok(Self {
            title: &post.title,
            slug: &post.slug,
            date: post.published_at.as_deref(),
            tags: post.tags.iter().map(|tag| tag.name.as_str()).collect(),
            content: images::substitute_origin(content, origin),
            feature_image: post
                .feature_image
                .as_deref()
                .map(|image| images::substitute_origin(image, origin)),
            authors,
            draft: post.status != "published",
            excerpt: post.excerpt.as_deref().unwrap_or_default(),
            canonical_url: canonical_url.into(),
        })
    }
}

/// Whether the provider output opens with YAML or TOML front matter.
pub fn has_front_matter(content: &str) -> bool {
    content.starts_with("---") || content.starts_with("+++")
}

async fn artifact_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.len() > 0)
        .unwrap_or(false)
}

enum Converted {
    Skipped,
    Saved {
        payload: String,
        reply: Reply,
        path: PathBuf,
    },
}

pub struct Converter<'a, P, J> {
    config: &'a Config,
    origin: Url,
    provider: &'a P,
    journal: &'a J,
    reporter: &'a dyn ProgressReporter,
    fetcher: Fetcher,
}

impl<'a, P: Provider, J: Journal> Converter<'a, P, J> {
    pub fn new(
        config: &'a Config,
        provider: &'a P,
        journal: &'a J,
        reporter: &'a dyn ProgressReporter,
    ) -> Result<Self, Fatal> {
        Ok(Self {
            origin: config.origin()?,
            config,
            provider,
            journal,
            reporter,
            fetcher: Fetcher::new(),
        })
    }

    pub fn artifact_path(&self, post: &Post) -> PathBuf {
        self.config
            .output
            .directory
            .join(format!("{}.mdx", post.slug))
    }

    async fn convert_post(
        &self,
        post: &Post,
        conversation: &Conversation,
    ) -> Result<Converted, PostError> {
        let path = self.artifact_path(post);
        if artifact_exists(&path).await {
            self.journal
                .info(&format!("Skipped post: {}", post.title))
                .await;
            return Ok(Converted::Skipped);
        }

        let directory = &self.config.output.directory;
        tokio::fs::create_dir_all(directory)
            .await
            .map_err(|error| PostError::Persist {
                path: directory.clone(),
                error,
            })?;

        self.reporter.update_post(
            &post.slug,
            PostStatus::ProcessingImages {
                total: images::extract(post.html()).len(),
            },
        );
        let processed = Pipeline::new(&self.config.images, &self.origin, &self.fetcher)
            .process(post, self.journal)
            .await;

        let payload = PreparedPost::new(post, &processed.content, &self.origin)?;
        let payload = serde_json::to_string(&payload).map_err(PostError::Encode)?;

        self.reporter.update_post(&post.slug, PostStatus::Transforming);
        let reply = self
            .provider
            .send_content(conversation, &payload, self.journal)
            .await?;
        info!(
            slug = %post.slug,
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            "content processed by provider"
        );

        if !has_front_matter(&reply.content) {
            self.journal
                .warn(&format!(
                    "Frontmatter missing for post \"{}\". The provider should have included it.",
                    post.title
                ))
                .await;
        }

        self.reporter.update_post(&post.slug, PostStatus::Saving);
        tokio::fs::write(&path, &reply.content)
            .await
            .map_err(|error| PostError::Persist {
                path: path.clone(),
                error,
            })?;
        debug!(path = %path.display(), "saved MDX file");
        self.journal
            .info(&format!("Successfully processed post: {}", post.title))
            .await;
        Ok(Converted::Saved {
            payload,
            reply,
            path,
        })
    }

    /// Convert the configured number of posts and run the image renamer.
    pub async fn run(&self, posts: &[Post], instructions: &str) -> Result<RunSummary, Fatal> {
        let count = self.config.process.count(posts.len());
        self.journal
            .info(&format!(
                "Found {} posts. Processing {count} posts.",
                posts.len()
            ))
            .await;
        let posts = &posts[..count];
        self.reporter
            .register_posts(posts.iter().map(|post| post.slug.clone()).collect());

        let mut summary = RunSummary::default();

        self.reporter.set_phase(RunPhase::Priming);
        let mut conversation = match self.provider.prime(instructions, self.journal).await {
            Ok(primed) => {
                summary.usage += primed.usage;
                primed.conversation
            }
            Err(provider::Error::DailyLimitReached { message }) => {
                summary.halted = Some(message);
                return Ok(self.finish(summary).await);
            }
            Err(error) => return Err(Fatal::Priming(error)),
        };
        self.reporter.set_usage(summary.usage);

        self.reporter.set_phase(RunPhase::ConvertingPosts);
        for (index, post) in posts.iter().enumerate() {
            self.journal
                .info(&format!(
                    "Processing post {} of {count}: {}",
                    index + 1,
                    post.title
                ))
                .await;

            let outcome = match self.convert_post(post, &conversation).await {
                Ok(Converted::Skipped) => {
                    self.reporter.update_post(&post.slug, PostStatus::Skipped);
                    PostOutcome::Skipped
                }
                Ok(Converted::Saved {
                    payload,
                    reply,
                    path,
                }) => {
                    summary.usage += reply.usage;
                    conversation = conversation.with_exchange(payload, reply.content);
                    self.reporter.update_post(&post.slug, PostStatus::Saved);
                    self.reporter.set_usage(summary.usage);
                    PostOutcome::Saved {
                        path,
                        usage: reply.usage,
                    }
                }
                Err(PostError::Provider(provider::Error::DailyLimitReached { message })) => {
                    self.reporter
                        .update_post(&post.slug, PostStatus::Failed(message.clone()));
                    summary
                        .outcomes
                        .push((post.slug.clone(), PostOutcome::Failed(message.clone())));
                    summary.halted = Some(message);
                    break;
                }
                Err(error) => {
                    self.journal
                        .error(&format!(
                            "Error processing post \"{}\": {error}",
                            post.title
                        ))
                        .await;
                    self.reporter
                        .update_post(&post.slug, PostStatus::Failed(error.to_string()));
                    PostOutcome::Failed(error.to_string())
                }
            };
            summary.outcomes.push((post.slug.clone(), outcome));

            if index + 1 < count {
                tokio::time::sleep(self.config.process.delay()).await;
            }
        }

        if summary.halted.is_none() && self.config.images.rename_downloaded {
            self.reporter.set_phase(RunPhase::RenamingImages);
            if let Err(error) = rename::rename_images(
                &self.config.images,
                &self.config.output.directory,
                self.journal,
            )
            .await
            {
                self.journal
                    .error(&format!("Image renaming failed: {error}"))
                    .await;
            }
        }

        Ok(self.finish(summary).await)
    }

    async fn finish(&self, mut summary: RunSummary) -> RunSummary {
        summary.attempted = summary.outcomes.len();
        match &summary.halted {
            Some(reason) => {
                self.journal
                    .warn(&format!(
                        "Daily rate limit reached. The run ended early: {reason}"
                    ))
                    .await;
                self.reporter.set_phase(RunPhase::Halted(reason.clone()));
            }
            None => {
                self.journal
                    .info(&format!(
                        "Conversion completed. Total posts processed: {}",
                        summary.attempted
                    ))
                    .await;
                self.reporter.set_phase(RunPhase::Completed);
            }
        }
        let usage = serde_json::to_string(&summary.usage).unwrap_or_default();
        self.journal
            .info(&format!("Final total usage: {usage}"))
            .await;
        self.reporter.set_usage(summary.usage);
        summary
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex, time::Duration};

    use pretty_assertions::assert_eq;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::{
        export::{Author, Tag},
        journal::MemoryJournal,
        progress::NullReporter,
        provider::Primed,
    };

    const MDX: &str = "---\ntitle: converted\n---\n\nBody\n";

    /// Provider answering from a fixed script.
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<Result<Reply, provider::Error>>>,
        /// Conversation length and payload of every call.
        seen: Mutex<Vec<(usize, String)>>,
        prime_error: Mutex<Option<provider::Error>>,
    }

    impl Scripted {
        fn new(replies: impl IntoIterator<Item = Result<Reply, provider::Error>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                seen: Mutex::default(),
                prime_error: Mutex::default(),
            }
        }

        fn failing_prime(error: provider::Error) -> Self {
            Self {
                prime_error: Mutex::new(Some(error)),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Provider for Scripted {
        async fn prime<J: Journal>(
            &self,
            instructions: &str,
            _journal: &J,
        ) -> Result<Primed, provider::Error> {
            if let Some(error) = self.prime_error.lock().unwrap().take() {
                return Err(error);
            }
            Ok(Primed {
                conversation: Conversation::new().with_exchange(instructions, "ok"),
                usage: Usage {
                    input_tokens: 10,
                    output_tokens: 1,
                },
            })
        }

        async fn send_content<J: Journal>(
            &self,
            conversation: &Conversation,
            payload: &str,
            _journal: &J,
        ) -> Result<Reply, provider::Error> {
            self.seen
                .lock()
                .unwrap()
                .push((conversation.turns().len(), payload.to_owned()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected provider call")
        }
    }

    fn reply(content: &str, input_tokens: u64, output_tokens: u64) -> Result<Reply, provider::Error> {
        Ok(Reply {
            content: content.to_owned(),
            usage: Usage {
                input_tokens,
                output_tokens,
            },
        })
    }

    fn config(dir: &Path, extra: &str) -> Config {
        let yaml = format!(
            r#"
output:
  directory: '{posts}'
ghost:
  url: https://blog.example.com
ai_service:
  provider: claude
  claude:
    api_key: test-key
images:
  output_directory: '{images}'
  placeholder: "<ImagePlaceholder />"
{extra}
"#,
            posts = dir.join("posts").display(),
            images = dir.join("images").display(),
        );
        Config::parse(&yaml, &dir.join("config.yaml")).unwrap()
    }

    fn post(slug: &str, html: &str) -> Post {
        Post {
            title: format!("Title of {slug}"),
            slug: slug.to_owned(),
            html: Some(html.to_owned()),
            status: "published".into(),
            ..Default::default()
        }
    }

    #[test]
    fn prepares_payload() {
        let origin = Url::parse("https://blog.example.com").unwrap();
        let post = Post {
            title: "Hello".into(),
            slug: "hello".into(),
            published_at: Some("2024-01-02T03:04:05.000Z".into()),
            tags: vec![Tag { name: "rust".into() }],
            feature_image: Some("__GHOST_URL__/content/images/cover.png".into()),
            status: "draft".into(),
            ..Default::default()
        };
        let prepared =
            PreparedPost::new(&post, r#"<a href="__GHOST_URL__/about/">About</a>"#, &origin)
                .unwrap();
        assert_eq!(
            serde_json::to_value(&prepared).unwrap(),
            serde_json::json!({
                "title": "Hello",
                "slug": "hello",
                "date": "2024-01-02T03:04:05.000Z",
                "tags": ["rust"],
                "content": r#"<a href="https://blog.example.com/about/">About</a>"#,
                "feature_image": "https://blog.example.com/content/images/cover.png",
                "authors": ["default"],
                "draft": true,
                "excerpt": "",
                "canonicalUrl": "https://blog.example.com/hello/",
            })
        );
    }

    #[test]
    fn canonical_url_follows_post_url() {
        let origin = Url::parse("https://blog.example.com").unwrap();
        let post = Post {
            slug: "hello".into(),
            url: Some("__GHOST_URL__/2024/hello/".into()),
            authors: vec![Author { name: "Ada".into() }],
            status: "published".into(),
            ..Default::default()
        };
        let prepared = PreparedPost::new(&post, "", &origin).unwrap();
        assert_eq!(prepared.canonical_url, "https://blog.example.com/2024/hello/");
        assert_eq!(prepared.authors, vec!["Ada"]);
        assert!(!prepared.draft);
    }

    #[test]
    fn detects_front_matter() {
        assert!(has_front_matter(MDX));
        assert!(has_front_matter("+++\ntitle = \"x\"\n+++\n"));
        assert!(!has_front_matter("# Just a heading"));
    }

    #[tokio::test]
    async fn failing_post_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "");
        let provider = Scripted::new([
            reply(MDX, 100, 50),
            Err(provider::Error::Api {
                status: reqwest::StatusCode::BAD_REQUEST,
                message: "bad payload".into(),
            }),
            reply(MDX, 200, 70),
        ]);
        let journal = MemoryJournal::default();
        let posts = [
            post("one", "<p>1</p>"),
            post("two", "<p>2</p>"),
            post("three", "<p>3</p>"),
        ];

        let converter = Converter::new(&config, &provider, &journal, &NullReporter).unwrap();
        let summary = converter.run(&posts, "instructions").await.unwrap();

        let out = dir.path().join("posts");
        assert_eq!(std::fs::read_to_string(out.join("one.mdx")).unwrap(), MDX);
        assert!(!out.join("two.mdx").exists());
        assert_eq!(std::fs::read_to_string(out.join("three.mdx")).unwrap(), MDX);
        assert_eq!(
            summary.usage,
            Usage {
                input_tokens: 310,
                output_tokens: 121,
            }
        );
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.halted, None);
        assert!(matches!(summary.outcomes[1].1, PostOutcome::Failed(_)));
        assert!(journal.contains("Error processing post \"Title of two\""));
        assert!(journal.contains("Successfully processed post: Title of three"));
        assert!(journal.contains("Conversion completed. Total posts processed: 3"));
        assert!(journal.contains(r#"Final total usage: {"input_tokens":310,"output_tokens":121}"#));

        // The failed exchange never enters the history.
        let seen = provider.seen.lock().unwrap();
        assert_eq!(
            seen.iter().map(|(turns, _)| *turns).collect::<Vec<_>>(),
            vec![2, 4, 4]
        );
    }

    #[tokio::test]
    async fn existing_artifacts_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "");
        let out = dir.path().join("posts");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("done.mdx"), "already converted").unwrap();
        std::fs::write(out.join("empty.mdx"), "").unwrap();

        let provider = Scripted::new([reply(MDX, 1, 1)]);
        let journal = MemoryJournal::default();
        let html = format!(r#"<img src="{}/cat.png" alt="Cat">"#, server.uri());
        let posts = [post("done", &html), post("empty", "<p>retry</p>")];

        let converter = Converter::new(&config, &provider, &journal, &NullReporter).unwrap();
        let summary = converter.run(&posts, "instructions").await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(summary.outcomes[0].1, PostOutcome::Skipped);
        assert_eq!(
            std::fs::read_to_string(out.join("done.mdx")).unwrap(),
            "already converted"
        );
        assert_eq!(std::fs::read_to_string(out.join("empty.mdx")).unwrap(), MDX);
        assert!(journal.contains("Skipped post: Title of done"));
    }

    #[tokio::test]
    async fn daily_limit_halts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), "");
        config.images.rename_downloaded = true;
        let provider = Scripted::new([
            reply(MDX, 5, 5),
            Err(provider::Error::DailyLimitReached {
                message: "daily rate limit".into(),
            }),
        ]);
        let journal = MemoryJournal::default();
        let posts = [
            post("one", "<p>1</p>"),
            post("two", "<p>2</p>"),
            post("three", "<p>3</p>"),
        ];

        let converter = Converter::new(&config, &provider, &journal, &NullReporter).unwrap();
        let summary = converter.run(&posts, "instructions").await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(summary.attempted, 2);
        assert!(journal.contains("Daily rate limit reached. The run ended early"));
        assert_eq!(summary.halted.as_deref(), Some("daily rate limit"));
        assert_eq!(summary.outcomes.len(), 2);
        assert!(!dir.path().join("posts/three.mdx").exists());
        assert!(!journal.contains("Conversion completed"));
        assert!(journal.contains(r#"Final total usage: {"input_tokens":15,"output_tokens":6}"#));
    }

    #[tokio::test]
    async fn daily_limit_while_priming_halts_before_any_post() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "");
        let provider = Scripted::failing_prime(provider::Error::DailyLimitReached {
            message: "quota".into(),
        });
        let journal = MemoryJournal::default();

        let converter = Converter::new(&config, &provider, &journal, &NullReporter).unwrap();
        let summary = converter
            .run(&[post("one", "<p>1</p>")], "instructions")
            .await
            .unwrap();

        assert_eq!(provider.calls(), 0);
        assert_eq!(summary.halted.as_deref(), Some("quota"));
        assert_eq!(summary.attempted, 0);
        assert!(journal.contains(r#"Final total usage: {"input_tokens":0,"output_tokens":0}"#));
    }

    #[tokio::test]
    async fn other_priming_failures_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "");
        let provider =
            Scripted::failing_prime(provider::Error::RateLimitExhausted { attempts: 3 });
        let journal = MemoryJournal::default();

        let converter = Converter::new(&config, &provider, &journal, &NullReporter).unwrap();
        let err = converter
            .run(&[post("one", "<p>1</p>")], "instructions")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Fatal::Priming(provider::Error::RateLimitExhausted { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn missing_images_degrade_to_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "");
        let provider = Scripted::new([reply("no front matter", 1, 1)]);
        let journal = MemoryJournal::default();
        let html = format!(r#"<p><img src="{}/gone.png" alt="Gone"></p>"#, server.uri());
        let posts = [post("broken", &html)];

        let converter = Converter::new(&config, &provider, &journal, &NullReporter).unwrap();
        let summary = converter.run(&posts, "instructions").await.unwrap();

        assert!(matches!(summary.outcomes[0].1, PostOutcome::Saved { .. }));
        let (_, payload) = provider.seen.lock().unwrap()[0].clone();
        let payload: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(payload["content"], "<p><ImagePlaceholder /></p>");
        assert!(journal.contains("Frontmatter missing for post \"Title of broken\""));
        assert!(journal.contains("Failed downloads: 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn paces_posts_and_respects_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(
            dir.path(),
            "process:\n  posts_to_process: 2\n  rate_limit_delay: 1500",
        );
        let provider = Scripted::new([reply(MDX, 1, 1), reply(MDX, 1, 1)]);
        let journal = MemoryJournal::default();
        let posts = [
            post("one", "<p>1</p>"),
            post("two", "<p>2</p>"),
            post("three", "<p>3</p>"),
        ];

        let started = tokio::time::Instant::now();
        let converter = Converter::new(&config, &provider, &journal, &NullReporter).unwrap();
        let summary = converter.run(&posts, "instructions").await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(summary.attempted, 2);
        assert!(journal.contains("Found 3 posts. Processing 2 posts."));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(3000), "{elapsed:?}");
    }

    #[tokio::test]
    async fn renames_images_after_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), "");
        config.images.rename_downloaded = true;
        let images = dir.path().join("images/trip");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("IMG_001.jpg"), b"jpeg").unwrap();
        let mdx = "---\ntitle: Trip\n---\n\n<Image alt=\"Sunny Beach\" src=\"/static/images/trip/IMG_001.jpg\" width={1} height={1} />\n";
        let provider = Scripted::new([reply(mdx, 1, 1)]);
        let journal = MemoryJournal::default();

        let converter = Converter::new(&config, &provider, &journal, &NullReporter).unwrap();
        converter
            .run(&[post("trip", "<p>trip</p>")], "instructions")
            .await
            .unwrap();

        assert!(images.join("sunny-beach.jpg").exists());
        let saved = std::fs::read_to_string(dir.path().join("posts/trip.mdx")).unwrap();
        assert!(saved.contains(r#"src="/static/images/trip/sunny-beach.jpg""#));
    }
}

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use derive_debug::Dbg;
use serde::Deserialize;
use url::Url;

/// Origin shipped in the sample configuration. Running against it would
/// download nothing and emit wrong canonical URLs, so it is rejected.
pub const EXAMPLE_ORIGIN: &str = "https://www.yourdomain.com";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config ({path}): {error}")]
    Read {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("failed to parse config ({path}): {error}")]
    Parse {
        path: PathBuf,
        error: serde_yaml::Error,
    },
    #[error("missing required configuration field: {0}")]
    MissingField(&'static str),
    #[error("invalid AI service provider specified in config: {0:?}")]
    UnknownProvider(String),
    #[error("please update the 'ghost.url' field with your actual Ghost blog URL")]
    ExampleOrigin,
    #[error("invalid ghost.url ({url}): {error}")]
    InvalidOrigin { url: String, error: url::ParseError },
    #[error("please update the 'ai_service.{0}.api_key' field with your actual API key")]
    PlaceholderApiKey(&'static str),
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default)]
    pub input: Input,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub ghost: Ghost,
    pub ai_service: AiService,
    #[serde(default)]
    pub images: Images,
    #[serde(default)]
    pub process: Process,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Input {
    #[serde(rename = "type", default = "default_input_type")]
    pub kind: String,
    #[serde(default)]
    pub path: PathBuf,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            kind: default_input_type(),
            path: PathBuf::new(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Output {
    #[serde(default)]
    pub directory: PathBuf,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Ghost {
    #[serde(default)]
    pub url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AiService {
    #[serde(default)]
    pub provider: String,
    #[serde(default = "default_instructions")]
    pub instructions: PathBuf,
    pub chatgpt: Option<ChatGpt>,
    pub claude: Option<Claude>,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Retry {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Milliseconds before the first retry; doubled on every further attempt.
    #[serde(default = "default_initial_retry_delay")]
    pub initial_retry_delay: u64,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_retry_delay: default_initial_retry_delay(),
        }
    }
}

#[derive(Deserialize, Clone, Dbg)]
pub struct ChatGpt {
    #[serde(default)]
    #[dbg(skip)]
    pub api_key: String,
    #[serde(default = "default_chatgpt_model")]
    pub model: String,
    #[serde(flatten)]
    pub retry: Retry,
    pub api_base: Option<Url>,
}

#[derive(Deserialize, Clone, Dbg)]
pub struct Claude {
    #[serde(default)]
    #[dbg(skip)]
    pub api_key: String,
    #[serde(default = "default_claude_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(flatten)]
    pub retry: Retry,
    pub api_base: Option<Url>,
}

/// The provider section selected by `ai_service.provider`.
#[derive(Debug, Clone, Copy)]
pub enum ProviderSettings<'a> {
    ChatGpt(&'a ChatGpt),
    Claude(&'a Claude),
}

#[derive(Deserialize, Clone, Debug)]
pub struct Images {
    #[serde(default = "default_image_dir")]
    pub output_directory: PathBuf,
    /// Site-relative prefix under which `output_directory` is served.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default = "default_true")]
    pub remove_failed: bool,
    #[serde(default)]
    pub rename_downloaded: bool,
}

impl Default for Images {
    fn default() -> Self {
        Self {
            output_directory: default_image_dir(),
            public_prefix: default_public_prefix(),
            placeholder: String::new(),
            remove_failed: true,
            rename_downloaded: false,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Process {
    /// `0` processes every post in the export.
    #[serde(default)]
    pub posts_to_process: usize,
    /// Pause between posts, in milliseconds.
    #[serde(default)]
    pub rate_limit_delay: u64,
}

impl Process {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay)
    }

    pub fn count(&self, available: usize) -> usize {
        if self.posts_to_process == 0 {
            available
        } else {
            self.posts_to_process.min(available)
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Logging {
    pub file: Option<PathBuf>,
}

fn default_input_type() -> String {
    "ghost".to_owned()
}

fn default_instructions() -> PathBuf {
    PathBuf::from("ai_instructions.xml")
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_retry_delay() -> u64 {
    1000
}

fn default_chatgpt_model() -> String {
    "gpt-4o-mini".to_owned()
}

fn default_claude_model() -> String {
    "claude-3-5-sonnet-20240620".to_owned()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("public/static/images")
}

fn default_public_prefix() -> String {
    "/static/images".to_owned()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn parse(src: &str, path: &Path) -> Result<Self, Error> {
        let mut config: Config = serde_yaml::from_str(src).map_err(|error| Error::Parse {
            path: path.to_owned(),
            error,
        })?;
        if config.ai_service.instructions.is_relative()
            && let Some(base) = path.parent()
        {
            config.ai_service.instructions = base.join(&config.ai_service.instructions);
        }
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self, Error> {
        let src = tokio::fs::read_to_string(path)
            .await
            .map_err(|error| Error::Read {
                path: path.to_owned(),
                error,
            })?;
        Self::parse(&src, path)
    }

    pub fn apply_overrides(&mut self, input: Option<PathBuf>, output: Option<PathBuf>) {
        if let Some(input) = input {
            self.input.path = input;
        }
        if let Some(output) = output {
            self.output.directory = output;
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.input.kind.is_empty() {
            return Err(Error::MissingField("input.type"));
        }
        if self.input.path.as_os_str().is_empty() {
            return Err(Error::MissingField("input.path"));
        }
        if self.output.directory.as_os_str().is_empty() {
            return Err(Error::MissingField("output.directory"));
        }
        if self.ai_service.provider.is_empty() {
            return Err(Error::MissingField("ai_service.provider"));
        }
        self.origin()?;
        let (name, api_key) = match self.ai_service.settings()? {
            ProviderSettings::ChatGpt(chatgpt) => ("chatgpt", &chatgpt.api_key),
            ProviderSettings::Claude(claude) => ("claude", &claude.api_key),
        };
        if api_key.is_empty() {
            return Err(Error::MissingField(match name {
                "chatgpt" => "ai_service.chatgpt.api_key",
                _ => "ai_service.claude.api_key",
            }));
        }
        if *api_key == format!("your_{name}_api_key_here") {
            return Err(Error::PlaceholderApiKey(name));
        }
        Ok(())
    }

    /// The blog's real origin, substituted for the export's URL token.
    pub fn origin(&self) -> Result<Url, Error> {
        let url = self.ghost.url.trim();
        if url.is_empty() {
            return Err(Error::MissingField("ghost.url"));
        }
        if url.trim_end_matches('/') == EXAMPLE_ORIGIN {
            return Err(Error::ExampleOrigin);
        }
        Url::parse(url).map_err(|error| Error::InvalidOrigin {
            url: url.to_owned(),
            error,
        })
    }
}

impl AiService {
    pub fn settings(&self) -> Result<ProviderSettings<'_>, Error> {
        match self.provider.as_str() {
            "chatgpt" => self
                .chatgpt
                .as_ref()
                .map(ProviderSettings::ChatGpt)
                .ok_or(Error::MissingField("ai_service.chatgpt")),
            "claude" => self
                .claude
                .as_ref()
                .map(ProviderSettings::Claude)
                .ok_or(Error::MissingField("ai_service.claude")),
            other => Err(Error::UnknownProvider(other.to_owned())),
        }
    }
}

//! Generative-text providers.
//!
//! Two shapes are supported: an assistant-thread service that runs each
//! request as an asynchronous job and has to be polled ([`chatgpt`]), and a
//! stateless message service that answers in a single request ([`claude`]).
//! Both sit behind [`Provider`]; callers never look at which one they hold.

use std::{
    ops::{Add, AddAssign},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    config::ProviderSettings,
    journal::Journal,
};

pub mod chatgpt;
pub mod claude;
mod retry;

pub use retry::RetryPolicy;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("rate limited: {message}")]
    RateLimited { message: String },
    #[error("max retries reached for rate limit after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
    #[error("daily rate limit reached: {message}")]
    DailyLimitReached { message: String },
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("content sent before the instructions were primed")]
    NotPrimed,
    #[error("instructions were already primed")]
    AlreadyPrimed,
}

/// Terminal failure of an asynchronous provider job.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("run failed: {0}")]
    Failed(String),
    #[error("run timed out after {0:?}")]
    TimedOut(Duration),
}

/// Token counts for one or more exchanges.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    /// Estimate for providers that do not report counts: one token per four
    /// characters, rounded up, on both sides.
    pub fn estimate(request: &str, response: &str) -> Self {
        Self {
            input_tokens: estimate_tokens(request),
            output_tokens: estimate_tokens(response),
        }
    }
}

impl Add for Usage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
        }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Conversation history carried between requests. Each step produces a new
/// history; nothing is mutated behind the caller's back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// History extended by one user message and the assistant's answer.
    pub fn with_exchange(mut self, user: impl Into<String>, assistant: impl Into<String>) -> Self {
        self.turns.push(Turn {
            role: Role::User,
            content: user.into(),
        });
        self.turns.push(Turn {
            role: Role::Assistant,
            content: assistant.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub usage: Usage,
}

/// Result of handing the fixed instructions to a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Primed {
    pub conversation: Conversation,
    pub usage: Usage,
}

pub trait Provider {
    /// Transmit the fixed instructions once per run.
    fn prime<J: Journal>(
        &self,
        instructions: &str,
        journal: &J,
    ) -> impl Future<Output = Result<Primed, Error>>;

    /// Transform one payload. Rate limits are retried with exponential
    /// backoff; everything else is returned as is.
    fn send_content<J: Journal>(
        &self,
        conversation: &Conversation,
        payload: &str,
        journal: &J,
    ) -> impl Future<Output = Result<Reply, Error>>;
}

/// A provider selected from configuration.
pub enum AnyProvider {
    ChatGpt(chatgpt::Assistant),
    Claude(claude::Messages),
}

impl AnyProvider {
    pub fn new(settings: ProviderSettings<'_>) -> Self {
        match settings {
            ProviderSettings::ChatGpt(settings) => Self::ChatGpt(chatgpt::Assistant::new(settings)),
            ProviderSettings::Claude(settings) => Self::Claude(claude::Messages::new(settings)),
        }
    }
}

impl Provider for AnyProvider {
    async fn prime<J: Journal>(&self, instructions: &str, journal: &J) -> Result<Primed, Error> {
        match self {
            Self::ChatGpt(provider) => provider.prime(instructions, journal).await,
            Self::Claude(provider) => provider.prime(instructions, journal).await,
        }
    }

    async fn send_content<J: Journal>(
        &self,
        conversation: &Conversation,
        payload: &str,
        journal: &J,
    ) -> Result<Reply, Error> {
        match self {
            Self::ChatGpt(provider) => provider.send_content(conversation, payload, journal).await,
            Self::Claude(provider) => provider.send_content(conversation, payload, journal).await,
        }
    }
}

/// Error body shared by both HTTP APIs: `{"error": {"message": .., ..}}`.
#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Deserialize, Debug, Default)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl ErrorDetail {
    fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "No specific error message provided".to_owned())
    }
}

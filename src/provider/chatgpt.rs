//! Assistant-thread provider.
//!
//! Priming binds the instructions to a new assistant. Each payload
//! then runs as a job on a fresh thread, which is polled until it reaches a
//! terminal state or the wall-clock ceiling passes. The API reports no token
//! counts for these jobs, so usage is always estimated.

use std::{sync::OnceLock, time::Duration};

use derive_debug::Dbg;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::{config, journal::Journal};

use super::{Conversation, Error, ErrorBody, Primed, Provider, Reply, RetryPolicy, RunError, Usage};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const ASSISTANT_NAME: &str = "Ghost to Next.js Converter";
const QUOTA_EXCEEDED: &str = "insufficient_quota";
const RUN_RATE_LIMITED: &str = "rate_limit_exceeded";

/// How a thread run is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polling {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Terminal state of one polled run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(String),
    Failed { code: Option<String>, message: String },
    TimedOut,
}

#[derive(Dbg)]
pub struct Assistant {
    #[dbg(skip)]
    client: reqwest::Client,
    base: String,
    #[dbg(skip)]
    api_key: String,
    model: String,
    assistant_id: OnceLock<String>,
    retry: RetryPolicy,
    polling: Polling,
}

#[derive(Serialize)]
struct CreateAssistant<'a> {
    name: &'a str,
    instructions: &'a str,
    tools: [Tool; 1],
    model: &'a str,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRun<'a> {
    assistant_id: &'a str,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct Run {
    status: String,
    #[serde(default)]
    last_error: Option<LastError>,
}

#[derive(Deserialize)]
struct LastError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    role: String,
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    text: Option<MessageText>,
}

#[derive(Deserialize)]
struct MessageText {
    value: String,
}

fn classify(status: StatusCode, text: &str) -> Error {
    let body = serde_json::from_str::<ErrorBody>(text).unwrap_or_default();
    let message = body.error.message();
    if status != StatusCode::TOO_MANY_REQUESTS {
        return Error::Api {
            status,
            message: body.error.message.unwrap_or_else(|| text.to_owned()),
        };
    }
    if body.error.code.as_deref() == Some(QUOTA_EXCEEDED) {
        Error::DailyLimitReached { message }
    } else {
        Error::RateLimited { message }
    }
}

impl Assistant {
    /// The assistant itself is registered by [`Provider::prime`].
    pub fn new(settings: &config::ChatGpt) -> Self {
        let base = settings
            .api_base
            .as_ref()
            .map(|url| url.as_str())
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_owned();
        Self {
            client: reqwest::Client::new(),
            base,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            assistant_id: OnceLock::new(),
            retry: settings.retry.into(),
            polling: Polling::default(),
        }
    }

    pub fn with_polling(mut self, polling: Polling) -> Self {
        self.polling = polling;
        self
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(format!("{}/{path}", self.base)))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(format!("{}/{path}", self.base)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        trace!(%status, %text, "chatgpt response");
        if !status.is_success() {
            return Err(classify(status, &text));
        }
        serde_json::from_str(&text).map_err(|error| Error::Decode(format!("chatgpt response: {error}")))
    }

    /// Poll a run once per interval until it is terminal or the ceiling passes.
    pub async fn poll_run(&self, thread_id: &str, run_id: &str) -> Result<RunOutcome, Error> {
        let deadline = Instant::now() + self.polling.timeout;
        while Instant::now() < deadline {
            let run: Run = self
                .send(self.get(&format!("threads/{thread_id}/runs/{run_id}")))
                .await?;
            match run.status.as_str() {
                "completed" => {
                    let content = self.latest_reply(thread_id).await?;
                    return Ok(RunOutcome::Completed(content));
                }
                "failed" | "cancelled" | "expired" => {
                    let (code, message) = run
                        .last_error
                        .map(|error| (error.code, error.message))
                        .unwrap_or_default();
                    return Ok(RunOutcome::Failed {
                        code,
                        message: message.unwrap_or_else(|| format!("run {}", run.status)),
                    });
                }
                status => trace!(status, run_id, "run still pending"),
            }
            tokio::time::sleep(self.polling.interval).await;
        }
        Ok(RunOutcome::TimedOut)
    }

    async fn latest_reply(&self, thread_id: &str) -> Result<String, Error> {
        let messages: MessageList = self
            .send(self.get(&format!("threads/{thread_id}/messages")))
            .await?;
        messages
            .data
            .into_iter()
            .find(|message| message.role == "assistant")
            .and_then(|message| message.content.into_iter().find_map(|content| content.text))
            .map(|text| text.value)
            .ok_or_else(|| Error::Decode("thread has no assistant reply".to_owned()))
    }

    async fn create_assistant(&self, instructions: &str) -> Result<Created, Error> {
        self.send(self.post("assistants").json(&CreateAssistant {
            name: ASSISTANT_NAME,
            instructions,
            tools: [Tool {
                kind: "code_interpreter",
            }],
            model: &self.model,
        }))
        .await
    }

    async fn attempt(&self, assistant_id: &str, payload: &str) -> Result<Reply, Error> {
        let thread: Created = self.send(self.post("threads").json(&serde_json::json!({}))).await?;
        let _: Created = self
            .send(
                self.post(&format!("threads/{}/messages", thread.id))
                    .json(&CreateMessage {
                        role: "user",
                        content: payload,
                    }),
            )
            .await?;
        let run: Created = self
            .send(
                self.post(&format!("threads/{}/runs", thread.id))
                    .json(&CreateRun { assistant_id }),
            )
            .await?;
        match self.poll_run(&thread.id, &run.id).await? {
            RunOutcome::Completed(content) => Ok(Reply {
                usage: Usage::estimate(payload, &content),
                content,
            }),
            RunOutcome::Failed { code, message } if code.as_deref() == Some(RUN_RATE_LIMITED) => {
                Err(Error::RateLimited { message })
            }
            RunOutcome::Failed { message, .. } => Err(RunError::Failed(message).into()),
            RunOutcome::TimedOut => Err(RunError::TimedOut(self.polling.timeout).into()),
        }
    }
}

impl Provider for Assistant {
    /// Registers the assistant carrying the instructions. The API reports no
    /// usage for this, so the instruction text is estimated.
    async fn prime<J: Journal>(&self, instructions: &str, journal: &J) -> Result<Primed, Error> {
        let created = self
            .retry
            .run(journal, || self.create_assistant(instructions))
            .await?;
        debug!(id = %created.id, "assistant created");
        self.assistant_id
            .set(created.id)
            .map_err(|_| Error::AlreadyPrimed)?;
        Ok(Primed {
            conversation: Conversation::new(),
            usage: Usage::estimate(instructions, ""),
        })
    }

    /// Each payload runs on its own thread, so the history is not resent.
    async fn send_content<J: Journal>(
        &self,
        _conversation: &Conversation,
        payload: &str,
        journal: &J,
    ) -> Result<Reply, Error> {
        let assistant_id = self.assistant_id.get().ok_or(Error::NotPrimed)?;
        self.retry
            .run(journal, || self.attempt(assistant_id, payload))
            .await
    }
}

//! Stateless message provider. Every request carries the whole conversation,
//! starting with the instructions, and is answered in one response.

use derive_debug::Dbg;
use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{config, journal::Journal};

use super::{Conversation, Error, ErrorBody, Primed, Provider, Reply, RetryPolicy, Role, Turn, Usage};

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DAILY_LIMIT_MARKER: &str = "daily rate limit";
pub const INSTRUCTIONS_ACK: &str = "Instructions received and understood.";

#[derive(Dbg)]
pub struct Messages {
    #[dbg(skip)]
    client: reqwest::Client,
    endpoint: String,
    #[dbg(skip)]
    api_key: String,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<&'a Turn>,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl Messages {
    pub fn new(settings: &config::Claude) -> Self {
        let base = settings
            .api_base
            .as_ref()
            .map(|url| url.as_str())
            .unwrap_or(DEFAULT_API_BASE);
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/messages", base.trim_end_matches('/')),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            retry: settings.retry.into(),
        }
    }

    async fn request(&self, messages: Vec<&Turn>) -> Result<Reply, Error> {
        let body = Request {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        trace!(%status, %text, "claude response");
        if !status.is_success() {
            return Err(classify(status, &text));
        }
        let response = serde_json::from_str::<Response>(&text)
            .map_err(|error| Error::Decode(format!("claude response: {error}")))?;
        let content = response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| Error::Decode("claude response has no text content".to_owned()))?;
        let usage = match response.usage {
            Some(usage) => usage,
            None => {
                let request = body
                    .messages
                    .iter()
                    .map(|turn| turn.content.as_str())
                    .collect::<String>();
                Usage::estimate(&request, &content)
            }
        };
        debug!(?usage, "claude request completed");
        Ok(Reply { content, usage })
    }
}

/// Map a failed response to the provider's own notion of rate limiting.
fn classify(status: StatusCode, text: &str) -> Error {
    let body = serde_json::from_str::<ErrorBody>(text).unwrap_or_default();
    let message = body.error.message();
    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || body.error.kind.as_deref() == Some("rate_limit_error");
    if rate_limited && message.contains(DAILY_LIMIT_MARKER) {
        Error::DailyLimitReached { message }
    } else if rate_limited {
        Error::RateLimited { message }
    } else {
        Error::Api {
            status,
            message: body.error.message.unwrap_or_else(|| text.to_owned()),
        }
    }
}

impl Provider for Messages {
    async fn prime<J: Journal>(&self, instructions: &str, journal: &J) -> Result<Primed, Error> {
        let turn = Turn {
            role: Role::User,
            content: instructions.to_owned(),
        };
        let reply = self
            .retry
            .run(journal, || self.request(vec![&turn]))
            .await?;
        Ok(Primed {
            conversation: Conversation::new().with_exchange(instructions, INSTRUCTIONS_ACK),
            usage: reply.usage,
        })
    }

    async fn send_content<J: Journal>(
        &self,
        conversation: &Conversation,
        payload: &str,
        journal: &J,
    ) -> Result<Reply, Error> {
        let turn = Turn {
            role: Role::User,
            content: payload.to_owned(),
        };
        self.retry
            .run(journal, || {
                let messages = conversation.turns().iter().chain([&turn]).collect();
                self.request(messages)
            })
            .await
    }
}

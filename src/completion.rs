//! Chat completion client for Groq's OpenAI-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::persona::PERSONA;

/// Shown when the API answers with a non-200 status.
pub const COMMUNICATION_FALLBACK: &str =
    "⚠️ Communication error with the intelligence service (Groq API). Check the key or try again later.";

/// Shown when the request never produced a usable answer.
pub const GENERIC_FALLBACK: &str = "⚠️ Intelligence error. Please try again later.";

const TEMPERATURE: f32 = 0.5;
const MAX_TOKENS: u32 = 512;

/// Anything that turns a prompt into reply text. Never fails: errors become fallback text.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn get_completion(&self, prompt: &str) -> String;
}

pub struct CompletionClient {
    api_key: String,
    endpoint: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: [ApiMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl CompletionClient {
    /// `base_url` is the API root, e.g. `https://api.groq.com/openai/v1`.
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        Ok(Self {
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
            http,
        })
    }

    /// One best-effort request. The error says which fallback applies.
    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ApiRequest {
            model: &self.model,
            messages: [
                ApiMessage { role: "system", content: PERSONA },
                ApiMessage { role: "user", content: prompt },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        debug!("Groq response status: {status}");

        if status != StatusCode::OK {
            return Err(CompletionError::Api { status, body });
        }

        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|e| CompletionError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(CompletionError::Empty)
    }
}

#[async_trait]
impl Completer for CompletionClient {
    async fn get_completion(&self, prompt: &str) -> String {
        match self.complete(prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Groq request failed: {e}");
                e.fallback().to_string()
            }
        }
    }
}

#[derive(Debug)]
pub enum CompletionError {
    /// Connection, timeout or body read failure.
    Transport(String),
    /// Any status other than 200.
    Api { status: StatusCode, body: String },
    Parse(String),
    /// No choice, or a choice with blank content.
    Empty,
}

impl CompletionError {
    pub fn fallback(&self) -> &'static str {
        match self {
            CompletionError::Api { .. } => COMMUNICATION_FALLBACK,
            CompletionError::Transport(_) | CompletionError::Parse(_) | CompletionError::Empty => {
                GENERIC_FALLBACK
            }
        }
    }
}

impl std::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionError::Transport(e) => write!(f, "HTTP error: {e}"),
            CompletionError::Api { status, body } => write!(f, "API error: {status}: {body}"),
            CompletionError::Parse(e) => write!(f, "Parse error: {e}"),
            CompletionError::Empty => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for CompletionError {}

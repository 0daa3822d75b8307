//! Self-hosted captioning backend: OpenAI-compatible `/chat/completions`.
//!
//! Targets Ollama by default but works against any server speaking the
//! chat-completions shape. The base URL is configurable (the path suffix
//! is not), responses are always requested non-streaming, and the whole
//! request is bounded by a generous timeout sized for local vision models
//! that may take minutes on CPU.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::message::{CaptionRequest, ChatMessage};
use crate::backend::{Caption, CaptionBackend};
use crate::config::CaptionConfig;
use crate::error::{CaptionError, RagmarkError};
use crate::pipeline::encode::encode_image;

/// Base URL used when neither the configuration nor [`BASE_URL_ENV`] name one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Environment variable consulted when no base URL is configured.
pub const BASE_URL_ENV: &str = "OLLAMA_BASE_URL";

/// Environment variable consulted when no model is configured.
pub const MODEL_ENV: &str = "OLLAMA_MODEL";

/// Model used when the configuration and environment name none.
pub const DEFAULT_MODEL: &str = "llava";

/// Upper bound on one caption request. Local vision models can be slow;
/// anything past this is treated as a failed request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const CHAT_COMPLETIONS_SUFFIX: &str = "/chat/completions";

// ── Wire types ───────────────────────────────────────────────────────────

/// [`ChatMessage`] already serializes to the chat-completions message
/// shape, so the request body reuses it directly.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

// ── Backend ──────────────────────────────────────────────────────────────

pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, RagmarkError> {
        Self::with_timeout(base_url, model, DEFAULT_TIMEOUT)
    }

    /// Like [`new`](Self::new) with an explicit per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RagmarkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagmarkError::Internal(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            model: model.into(),
        })
    }

    /// Resolve base URL, model, and timeout from the configuration with
    /// environment fallbacks ([`BASE_URL_ENV`], [`MODEL_ENV`]).
    pub fn from_config(config: &CaptionConfig) -> Result<Self, RagmarkError> {
        let base_url = config
            .base_url
            .clone()
            .filter(|u| !u.is_empty())
            .or_else(|| std::env::var(BASE_URL_ENV).ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = config
            .model
            .clone()
            .filter(|m| !m.is_empty())
            .or_else(|| std::env::var(MODEL_ENV).ok().filter(|m| !m.is_empty()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout = config.timeout.unwrap_or(DEFAULT_TIMEOUT);
        Self::with_timeout(base_url, model, timeout)
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CHAT_COMPLETIONS_SUFFIX)
    }
}

#[async_trait]
impl CaptionBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn dispatch(&self, request: CaptionRequest) -> Result<Caption, CaptionError> {
        let CaptionRequest { prompt, image } = request;

        let message = match &image {
            Some(img) => {
                let payload = encode_image(img)
                    .map_err(|e| CaptionError::classify(format!("image encoding failed: {e}")))?;
                ChatMessage::user_with_image(prompt, payload.to_data_url())
            }
            None => ChatMessage::user(prompt),
        };
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![message],
            stream: false,
        };

        debug!(
            model = %self.model,
            endpoint = %self.endpoint(),
            has_image = image.is_some(),
            "calling chat completions"
        );
        let response = self
            .client
            .post(self.endpoint())
            // Placeholder credential; OpenAI-compatible servers want the
            // header present even when they ignore its value.
            .header("Authorization", "Bearer ollama")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                CaptionError::classify(format!("request to captioning backend failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CaptionError::classify(format!("HTTP {status}: {detail}")));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            CaptionError::classify(format!("invalid response from captioning backend: {e}"))
        })?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if text.is_empty() {
            return Err(CaptionError::classify(
                "captioning backend returned no text",
            ));
        }
        Ok(Caption { text })
    }
}

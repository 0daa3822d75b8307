//! Captioning backend abstraction: one contract, two implementations.
//!
//! ## Why one trait?
//!
//! Both backends accept the same chat-style messages and both return one
//! text payload; only the wire protocol differs. [`CaptionBackend::caption`]
//! is a provided method that normalizes the messages once and hands the
//! result to the variant's [`CaptionBackend::dispatch`], so the extraction
//! and default-prompt rules exist in exactly one place.
//!
//! The variant is selected once, at configuration time, by [`from_config`].
//! A backend holds one `reqwest::Client` and no other state, so a single
//! instance is safe to share across concurrent tasks; no retries or locks
//! live at this layer.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BackendKind, CaptionConfig};
use crate::error::{CaptionError, RagmarkError};

pub mod gemini;
pub mod message;
pub mod ollama;

pub use gemini::GeminiBackend;
pub use message::{CaptionRequest, ChatMessage, ContentPart, ImageUrl, MessageContent, Role};
pub use ollama::OllamaBackend;

use message::normalize_messages;

/// A successful caption: one plain-text payload, identical shape no matter
/// which backend answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caption {
    pub text: String,
}

/// A captioning backend.
///
/// Implementations provide [`dispatch`](Self::dispatch) for their native
/// protocol; callers use [`caption`](Self::caption). Every failure leaves
/// this trait as a classified [`CaptionError`].
#[async_trait]
pub trait CaptionBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Send one already-normalized request over the native protocol.
    async fn dispatch(&self, request: CaptionRequest) -> Result<Caption, CaptionError>;

    /// Caption from a chat-style message list.
    ///
    /// Normalizes the messages (first user text, first inline image,
    /// default prompt when text is absent) and dispatches. No retries
    /// happen here; classification exists so the caller can decide.
    async fn caption(&self, messages: &[ChatMessage]) -> Result<Caption, CaptionError> {
        let request = normalize_messages(messages)?;
        debug!(
            backend = self.name(),
            has_image = request.image.is_some(),
            prompt_chars = request.prompt.chars().count(),
            "dispatching caption request"
        );
        self.dispatch(request).await
    }
}

/// Construct the configured backend variant.
///
/// All resolution (explicit config, environment fallbacks, defaults)
/// happens here, once. A missing hosted API key surfaces as
/// [`RagmarkError::InvalidConfig`] at construction rather than as a
/// mid-request failure.
pub fn from_config(config: &CaptionConfig) -> Result<Arc<dyn CaptionBackend>, RagmarkError> {
    match config.backend {
        BackendKind::Gemini => Ok(Arc::new(GeminiBackend::from_config(config)?)),
        BackendKind::Ollama => Ok(Arc::new(OllamaBackend::from_config(config)?)),
    }
}

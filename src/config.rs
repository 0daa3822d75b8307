//! Configuration types for document conversion and captioning.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks and to log the settings a run
//! actually used.
//!
//! Captioning is configured separately in [`CaptionConfig`] because not every
//! conversion needs a vision backend; `ConversionConfig::caption` stays `None`
//! for text-only pipelines.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RagmarkError;

/// Largest input document accepted, in bytes (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Configuration for one conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use ragmark::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .max_file_size(10 * 1024 * 1024)
///     .page_markers(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Reject inputs larger than this many bytes. Default: 100 MiB.
    ///
    /// Oversized files fail fast with a size error instead of tying up a
    /// converter for minutes and then failing anyway.
    pub max_file_size: u64,

    /// Splice `<!-- Page N -->` markers into PDF output. Default: true.
    ///
    /// Markers let retrieval layers cite the page a chunk came from. They
    /// only ever apply to PDF sources; other formats pass through untouched
    /// regardless of this flag.
    pub page_markers: bool,

    /// Captioning backend settings. `None` disables image captioning.
    pub caption: Option<CaptionConfig>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            page_markers: true,
            caption: None,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn page_markers(mut self, enabled: bool) -> Self {
        self.config.page_markers = enabled;
        self
    }

    pub fn caption(mut self, caption: CaptionConfig) -> Self {
        self.config.caption = Some(caption);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, RagmarkError> {
        let c = &self.config;
        if c.max_file_size == 0 {
            return Err(RagmarkError::InvalidConfig(
                "max_file_size must be at least 1 byte".into(),
            ));
        }
        if let Some(caption) = &c.caption {
            if caption.timeout == Some(Duration::ZERO) {
                return Err(RagmarkError::InvalidConfig(
                    "caption timeout must be positive".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Captioning ───────────────────────────────────────────────────────────

/// Settings for the captioning backend.
///
/// Every field except `backend` is optional; resolution order is always
/// explicit value, then environment variable, then built-in default. The
/// per-backend constants live on [`crate::backend::gemini`] and
/// [`crate::backend::ollama`].
#[derive(Clone, Default)]
pub struct CaptionConfig {
    /// Which backend variant to construct.
    pub backend: BackendKind,

    /// Model identifier. `None` falls back to `OLLAMA_MODEL` (self-hosted)
    /// or the backend's default model.
    pub model: Option<String>,

    /// Base URL for the self-hosted backend. `None` falls back to
    /// `OLLAMA_BASE_URL`, then `http://localhost:11434/v1`. Ignored by the
    /// hosted backend.
    pub base_url: Option<String>,

    /// API key for the hosted backend. `None` falls back to
    /// `GOOGLE_GENAI_API_KEY`. Ignored by the self-hosted backend.
    pub api_key: Option<String>,

    /// Per-request timeout for the self-hosted backend. `None` means the
    /// 300-second default. The hosted backend keeps its client defaults.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for CaptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptionConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// The two captioning backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted Google Gemini API. Needs an API key.
    Gemini,
    /// Self-hosted OpenAI-compatible server, Ollama by default. (default)
    #[default]
    Ollama,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Gemini => write!(f, "gemini"),
            BackendKind::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = RagmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(BackendKind::Gemini),
            "ollama" | "local" => Ok(BackendKind::Ollama),
            other => Err(RagmarkError::InvalidConfig(format!(
                "unknown caption backend '{other}' (expected 'gemini' or 'ollama')"
            ))),
        }
    }
}

//! Error types for the ragmark library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RagmarkError`] is **fatal**: the conversion cannot proceed at all
//!   (missing input file, oversized file, broken converter, bad
//!   configuration). Returned as `Err(RagmarkError)` from the top-level
//!   `convert`/`inspect` functions.
//!
//! * [`CaptionError`] is **classified**: a captioning backend call failed.
//!   Every backend failure is folded into a small stable taxonomy so an
//!   outer caller can pick a retry policy by tag (back off on
//!   `RATE_LIMIT`/`OVERLOADED`, fail fast on `GENERIC_BACKEND_ERROR`)
//!   without parsing provider-specific error prose.
//!
//! The adapter never swallows a backend failure: the original error text is
//! always carried inside the classified variant.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ragmark library.
///
/// Captioning failures are classified as [`CaptionError`] and wrapped
/// transparently so callers can still match on the taxonomy.
#[derive(Debug, Error)]
pub enum RagmarkError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Input file exceeds the configured size limit.
    #[error("File too large: {:.2}MB exceeds {:.0}MB limit", mb(.size_bytes), mb(.limit_bytes))]
    FileTooLarge {
        path: PathBuf,
        size_bytes: u64,
        limit_bytes: u64,
    },

    /// The file exists but could not be read (permissions, I/O fault).
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The document-to-text converter collaborator failed.
    #[error("Conversion failed for '{path}': {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    // ── Captioning errors ─────────────────────────────────────────────────
    /// A captioning backend call failed; see [`CaptionError`] for the tag.
    #[error(transparent)]
    Caption(#[from] CaptionError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or backend-factory validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RagmarkError {
    /// Message safe to surface to an end user.
    ///
    /// File-validation errors carry their own wording; classified captioning
    /// errors map per [`CaptionError::user_message`]; everything else falls
    /// back to a generic failure line so raw backend/converter text never
    /// reaches users.
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { .. } | Self::FileTooLarge { .. } => self.to_string(),
            Self::Caption(err) => err.user_message().to_owned(),
            _ => GENERIC_USER_MESSAGE.to_owned(),
        }
    }
}

/// Fallback user-facing failure line. Raw backend or converter text never
/// reaches end users; anything unclassified collapses to this.
pub const GENERIC_USER_MESSAGE: &str =
    "Processing failed! The server might be overloaded, please try again later.";

fn mb(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

/// A classified captioning-backend failure.
///
/// The variant is the stable category tag; the `message` is the raw error
/// text from the backend (HTTP status + body, transport error, decode
/// failure). Both survive into the `Display` output as `"TAG: message"`.
#[derive(Debug, Clone, Error)]
pub enum CaptionError {
    /// Backend reports throttling or quota exhaustion; recoverable with backoff.
    #[error("RATE_LIMIT: {message}")]
    RateLimit { message: String },

    /// Backend reports a server-side fault; possibly transient.
    #[error("INTERNAL_ERROR: {message}")]
    Internal { message: String },

    /// Backend reports capacity exhaustion; recoverable with backoff.
    #[error("OVERLOADED: {message}")]
    Overloaded { message: String },

    /// Uncategorised failure; treat as non-retryable unless proven otherwise.
    #[error("GENERIC_BACKEND_ERROR: {message}")]
    Backend { message: String },
}

impl CaptionError {
    /// Classify a raw backend error text into the taxonomy.
    ///
    /// Matching is case-insensitive substring search with fixed precedence:
    /// rate limit beats internal beats overloaded beats generic. The rules
    /// live here and nowhere else; backends feed every failure through this
    /// one function.
    pub fn classify(raw: impl Into<String>) -> Self {
        let message = raw.into();
        let lower = message.to_lowercase();
        if lower.contains("429") || lower.contains("quota") || lower.contains("rate") {
            Self::RateLimit { message }
        } else if lower.contains("500") || lower.contains("internal") {
            Self::Internal { message }
        } else if lower.contains("503") || lower.contains("overload") {
            Self::Overloaded { message }
        } else {
            Self::Backend { message }
        }
    }

    /// Stable category tag, independent of which backend produced the error.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::RateLimit { .. } => "RATE_LIMIT",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Overloaded { .. } => "OVERLOADED",
            Self::Backend { .. } => "GENERIC_BACKEND_ERROR",
        }
    }

    /// The raw backend error text, unmodified.
    pub fn message(&self) -> &str {
        match self {
            Self::RateLimit { message }
            | Self::Internal { message }
            | Self::Overloaded { message }
            | Self::Backend { message } => message,
        }
    }

    /// Whether an outer caller may reasonably retry after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Backend { .. })
    }

    /// User-facing message for this category; never exposes the raw text.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimit { .. } => "Captioning backend rate limit hit",
            Self::Internal { .. } => "Captioning backend internal server error",
            Self::Overloaded { .. } => "Captioning backend overloaded",
            Self::Backend { .. } => GENERIC_USER_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_429_as_rate_limit() {
        let e = CaptionError::classify("HTTP 429 Too Many Requests");
        assert!(matches!(e, CaptionError::RateLimit { .. }));
        assert!(e.message().contains("429 Too Many Requests"));
    }

    #[test]
    fn classify_quota_case_insensitive() {
        let e = CaptionError::classify("QUOTA exceeded for project");
        assert!(matches!(e, CaptionError::RateLimit { .. }));
    }

    #[test]
    fn classify_503_as_overloaded() {
        let e = CaptionError::classify("Service Unavailable 503");
        assert!(matches!(e, CaptionError::Overloaded { .. }));
    }

    #[test]
    fn classify_internal() {
        let e = CaptionError::classify("An Internal fault occurred");
        assert!(matches!(e, CaptionError::Internal { .. }));
    }

    #[test]
    fn classify_unrelated_as_generic() {
        let e = CaptionError::classify("connection refused");
        assert!(matches!(e, CaptionError::Backend { .. }));
        assert!(!e.is_retryable());
    }

    #[test]
    fn classify_precedence_rate_beats_internal() {
        // Both signal sets match; the rate-limit rule wins.
        let e = CaptionError::classify("429: internal quota system rejected the call");
        assert!(matches!(e, CaptionError::RateLimit { .. }));
    }

    #[test]
    fn classify_precedence_internal_beats_overloaded() {
        let e = CaptionError::classify("internal error: upstream overloaded");
        assert!(matches!(e, CaptionError::Internal { .. }));
    }

    #[test]
    fn display_prefixes_tag() {
        let e = CaptionError::classify("model blew up");
        assert_eq!(e.to_string(), "GENERIC_BACKEND_ERROR: model blew up");
        let e = CaptionError::classify("rate limited");
        assert_eq!(e.to_string(), "RATE_LIMIT: rate limited");
    }

    #[test]
    fn tags_are_stable() {
        assert_eq!(CaptionError::classify("429").tag(), "RATE_LIMIT");
        assert_eq!(CaptionError::classify("500").tag(), "INTERNAL_ERROR");
        assert_eq!(CaptionError::classify("503").tag(), "OVERLOADED");
        assert_eq!(CaptionError::classify("x").tag(), "GENERIC_BACKEND_ERROR");
    }

    #[test]
    fn file_too_large_display() {
        let e = RagmarkError::FileTooLarge {
            path: PathBuf::from("/tmp/big.pdf"),
            size_bytes: 150 * 1024 * 1024,
            limit_bytes: 100 * 1024 * 1024,
        };
        let msg = e.to_string();
        assert!(msg.contains("150.00MB"), "got: {msg}");
        assert!(msg.contains("100MB limit"), "got: {msg}");
    }

    #[test]
    fn file_not_found_display() {
        let e = RagmarkError::FileNotFound {
            path: PathBuf::from("/missing/doc.pdf"),
        };
        assert_eq!(e.to_string(), "File not found: /missing/doc.pdf");
    }

    #[test]
    fn user_message_mapping() {
        let rate = RagmarkError::Caption(CaptionError::classify("429"));
        assert_eq!(rate.user_message(), "Captioning backend rate limit hit");

        let generic = RagmarkError::Internal("task panicked".into());
        assert!(generic.user_message().starts_with("Processing failed!"));

        let missing = RagmarkError::FileNotFound {
            path: PathBuf::from("a.pdf"),
        };
        assert_eq!(missing.user_message(), "File not found: a.pdf");
    }

    #[test]
    fn retryable_categories() {
        assert!(CaptionError::classify("quota").is_retryable());
        assert!(CaptionError::classify("500").is_retryable());
        assert!(CaptionError::classify("overloaded").is_retryable());
        assert!(!CaptionError::classify("weird").is_retryable());
    }
}

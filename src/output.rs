//! Result types returned by the conversion entry points.
//!
//! Everything here is serializable so callers embedding the crate in a
//! service can hand these straight to their response layer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A finished conversion: the Markdown plus bookkeeping about how it
/// was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Source document as given by the caller.
    pub source: PathBuf,
    /// Markdown content, page markers included when they apply.
    pub markdown: String,
    pub stats: ConversionStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Wall-clock time spent converting, in milliseconds.
    pub duration_ms: u64,
    /// Characters (not bytes) of Markdown before marker injection.
    pub content_chars: usize,
    /// Pages reported by the caller or the structural probe, if any.
    pub page_count: Option<usize>,
    /// Markers actually spliced into the output.
    pub markers_injected: usize,
}

/// Structural facts about a PDF, best effort. Fields stay `None` when the
/// file cannot be parsed; inspection never hard-fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfInfo {
    pub path: PathBuf,
    pub page_count: Option<usize>,
    pub title: Option<String>,
    pub author: Option<String>,
}

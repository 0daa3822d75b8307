//! Conversion entry points.
//!
//! ## Why the engine is a parameter
//!
//! Everything this module adds around [`DocumentConverter::to_markdown`] is
//! engine-independent: existence and size validation, wall-clock timing,
//! page-marker injection for PDF sources, and the final stats. Taking the
//! engine as a trait object keeps those guarantees identical no matter
//! which parser produced the Markdown, and lets tests drive the whole path
//! with a stub.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ConversionConfig;
use crate::converter::DocumentConverter;
use crate::error::RagmarkError;
use crate::output::{ConversionOutput, ConversionStats, PdfInfo};
use crate::pipeline::{markers, probe};

/// Convert a document to Markdown.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `path`: Local path to the source document
/// * `converter`: Engine that produces the raw Markdown
/// * `config`: Conversion configuration
///
/// # Errors
/// * [`RagmarkError::FileNotFound`] when `path` does not name a file
/// * [`RagmarkError::FileTooLarge`] when the file exceeds `config.max_file_size`
/// * whatever the engine returns, passed through unchanged
pub async fn convert(
    path: impl AsRef<Path>,
    converter: &dyn DocumentConverter,
    config: &ConversionConfig,
) -> Result<ConversionOutput, RagmarkError> {
    let total_start = Instant::now();
    let path = path.as_ref();
    info!("Starting conversion: {}", path.display());

    // ── Step 1: Validate the input ───────────────────────────────────────
    let file_meta = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RagmarkError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RagmarkError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    if !file_meta.is_file() {
        return Err(RagmarkError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if file_meta.len() > config.max_file_size {
        return Err(RagmarkError::FileTooLarge {
            path: path.to_path_buf(),
            size_bytes: file_meta.len(),
            limit_bytes: config.max_file_size,
        });
    }

    // ── Step 2: Probe the page count for PDF sources ─────────────────────
    let is_pdf = markers::is_pdf_path(path);
    let page_count = if config.page_markers && is_pdf {
        let count = probe::pdf_page_count(path).await;
        match count {
            Some(n) => info!("PDF reports {} pages", n),
            None => warn!("Could not determine page count for {}", path.display()),
        }
        count
    } else {
        None
    };

    // ── Step 3: Run the conversion engine ────────────────────────────────
    let engine_start = Instant::now();
    let markdown = converter.to_markdown(path).await?;
    let content_chars = markdown.chars().count();
    debug!(
        "Engine produced {} chars in {}ms",
        content_chars,
        engine_start.elapsed().as_millis()
    );

    // ── Step 4: Inject page markers ──────────────────────────────────────
    // The count was resolved in step 2; the splice never re-reads the file.
    let markdown = if config.page_markers && is_pdf {
        tokio::task::spawn_blocking(move || markers::splice_markers(&markdown, page_count))
            .await
            .map_err(|e| RagmarkError::Internal(format!("marker injection task failed: {e}")))?
    } else {
        markdown
    };
    let markers_injected = markers::count_page_markers(&markdown);

    // ── Step 5: Assemble the output ──────────────────────────────────────
    let stats = ConversionStats {
        duration_ms: total_start.elapsed().as_millis() as u64,
        content_chars,
        page_count,
        markers_injected,
    };
    info!(
        "Conversion complete: {} chars before markers, {} after, {} markers, {}ms",
        content_chars,
        markdown.chars().count(),
        markers_injected,
        stats.duration_ms
    );

    Ok(ConversionOutput {
        source: path.to_path_buf(),
        markdown,
        stats,
    })
}

/// Convert a document and write the Markdown to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    converter: &dyn DocumentConverter,
    config: &ConversionConfig,
) -> Result<ConversionStats, RagmarkError> {
    let output = convert(path, converter, config).await?;
    let out = output_path.as_ref();

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RagmarkError::Io {
                    path: out.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = out.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, &output.markdown)
        .await
        .map_err(|e| RagmarkError::Io {
            path: out.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, out)
        .await
        .map_err(|e| RagmarkError::Io {
            path: out.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    path: impl AsRef<Path>,
    converter: &dyn DocumentConverter,
    config: &ConversionConfig,
) -> Result<ConversionOutput, RagmarkError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| RagmarkError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(path, converter, config))
}

/// Read structural PDF facts without converting content.
///
/// Needs no conversion engine or captioning backend. The file must exist;
/// everything past that is best effort and lands as `None` fields.
pub async fn inspect(path: impl AsRef<Path>) -> Result<PdfInfo, RagmarkError> {
    let path = path.as_ref();
    tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RagmarkError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RagmarkError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    Ok(probe::pdf_info(path).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::probe::write_test_pdf;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct StubConverter {
        markdown: String,
    }

    #[async_trait]
    impl DocumentConverter for StubConverter {
        async fn to_markdown(&self, _path: &Path) -> Result<String, RagmarkError> {
            Ok(self.markdown.clone())
        }
    }

    struct FailingConverter;

    #[async_trait]
    impl DocumentConverter for FailingConverter {
        async fn to_markdown(&self, path: &Path) -> Result<String, RagmarkError> {
            Err(RagmarkError::ConversionFailed {
                path: path.to_path_buf(),
                detail: "engine exploded".into(),
            })
        }
    }

    fn stub(markdown: &str) -> StubConverter {
        StubConverter {
            markdown: markdown.to_string(),
        }
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = convert(
            PathBuf::from("/definitely/not/here.pdf"),
            &stub("x"),
            &ConversionConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RagmarkError::FileNotFound { .. }));
        assert!(err.user_message().starts_with("File not found:"));
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let config = ConversionConfig::builder()
            .max_file_size(16)
            .build()
            .unwrap();
        let err = convert(&path, &stub("x"), &config).await.unwrap_err();
        assert!(matches!(
            err,
            RagmarkError::FileTooLarge {
                size_bytes: 64,
                limit_bytes: 16,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn non_pdf_source_passes_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "irrelevant").unwrap();

        let output = convert(&path, &stub("# Notes\n\nBody."), &ConversionConfig::default())
            .await
            .unwrap();
        assert_eq!(output.markdown, "# Notes\n\nBody.");
        assert_eq!(output.stats.markers_injected, 0);
        assert!(output.stats.page_count.is_none());
    }

    #[tokio::test]
    async fn pdf_source_gets_probed_and_marked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        write_test_pdf(&path, 4, None, None);

        let markdown = "x".repeat(100);
        let output = convert(&path, &stub(&markdown), &ConversionConfig::default())
            .await
            .unwrap();
        assert_eq!(output.stats.page_count, Some(4));
        assert_eq!(output.stats.markers_injected, 4);
        assert_eq!(output.stats.content_chars, 100);
        // Four 16-char marker literals on top of the engine output.
        assert_eq!(output.markdown.chars().count(), 100 + 4 * 16);
        assert!(output.markdown.starts_with("<!-- Page 1 -->\n"));
        assert!(output.markdown.contains("<!-- Page 4 -->\n"));
    }

    #[tokio::test]
    async fn unparseable_pdf_skips_markers() {
        // The probe in step 2 fails; the splice must treat that as final
        // rather than probing the file a second time.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let output = convert(&path, &stub("content"), &ConversionConfig::default())
            .await
            .unwrap();
        assert_eq!(output.markdown, "content");
        assert!(output.stats.page_count.is_none());
        assert_eq!(output.stats.markers_injected, 0);
    }

    #[tokio::test]
    async fn page_markers_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        write_test_pdf(&path, 4, None, None);

        let config = ConversionConfig::builder()
            .page_markers(false)
            .build()
            .unwrap();
        let output = convert(&path, &stub("content"), &config).await.unwrap();
        assert_eq!(output.markdown, "content");
        assert_eq!(output.stats.markers_injected, 0);
    }

    #[tokio::test]
    async fn engine_errors_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        write_test_pdf(&path, 1, None, None);

        let err = convert(&path, &FailingConverter, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RagmarkError::ConversionFailed { .. }));
        assert_eq!(err.user_message(), crate::error::GENERIC_USER_MESSAGE);
    }

    #[tokio::test]
    async fn convert_to_file_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("doc.pdf");
        write_test_pdf(&source, 2, None, None);
        let dest = dir.path().join("out/doc.md");

        let stats = convert_to_file(&source, &dest, &stub("ab"), &ConversionConfig::default())
            .await
            .unwrap();
        assert_eq!(stats.markers_injected, 2);
        let written = std::fs::read_to_string(&dest).unwrap();
        assert!(written.starts_with("<!-- Page 1 -->\n"));
    }

    #[tokio::test]
    async fn inspect_reads_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("titled.pdf");
        write_test_pdf(&path, 3, Some("Quarterly Report"), Some("A. Writer"));

        let info = inspect(&path).await.unwrap();
        assert_eq!(info.page_count, Some(3));
        assert_eq!(info.title.as_deref(), Some("Quarterly Report"));
    }

    #[tokio::test]
    async fn inspect_missing_file_errors() {
        let err = inspect(PathBuf::from("/no/such.pdf")).await.unwrap_err();
        assert!(matches!(err, RagmarkError::FileNotFound { .. }));
    }

    #[test]
    fn convert_sync_wraps_the_async_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.txt");
        std::fs::write(&path, "x").unwrap();

        let output = convert_sync(&path, &stub("plain"), &ConversionConfig::default()).unwrap();
        assert_eq!(output.markdown, "plain");
    }
}

//! Page-boundary marker injection: proportional distribution of
//! `<!-- Page N -->` markers across converted Markdown.
//!
//! ## Why proportional?
//!
//! Converters emit one Markdown blob per document, not per page. Recovering
//! true page boundaries would require a second, expensive extraction pass
//! over the PDF. Instead, markers are spread across the text at character
//! offsets proportional to the page index: page `p` of `N` (0-based) lands
//! at `floor(p * L / N)` where `L` is the total character length. That makes
//! the markers a best-effort boundary hint, not an exact mapping; pages are
//! not equal-length in characters and the contract never claims otherwise.
//!
//! ## Guarantees
//!
//! - Original characters are never duplicated, reordered, or dropped; the
//!   output is the input plus exactly one marker literal per page.
//! - Offsets are monotonically non-decreasing and page 1 sits at offset 0.
//!   When the text is shorter than the page count, several offsets coincide
//!   and their markers appear consecutively in page order.
//! - Offsets are computed in characters and mapped to byte positions, so a
//!   marker never splits a multi-byte UTF-8 sequence.
//! - Missing or zero page counts degrade to a no-op; this path never fails.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::pipeline::probe;

/// A planned marker insertion point.
///
/// `offset` is a character (not byte) offset into the unmarked Markdown;
/// `page` is the 1-based page number the marker announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMarker {
    pub offset: usize,
    pub page: usize,
}

impl PageMarker {
    /// The literal text spliced into the Markdown for this marker.
    pub fn literal(&self) -> String {
        format!("<!-- Page {} -->\n", self.page)
    }
}

/// Compute marker insertion points for `total_chars` characters split
/// across `page_count` pages.
///
/// Returns one [`PageMarker`] per page, offset `floor(p * total_chars /
/// page_count)` for page index `p`. Page 1 is always at offset 0 and the
/// offsets never decrease. A zero `page_count` yields no markers.
pub fn page_markers(total_chars: usize, page_count: usize) -> Vec<PageMarker> {
    (0..page_count)
        .map(|p| PageMarker {
            offset: p * total_chars / page_count,
            page: p + 1,
        })
        .collect()
}

/// Splice page-boundary markers into `markdown` for the PDF at
/// `source_path`.
///
/// Passthrough cases (input returned unchanged):
/// - `source_path` does not have a `.pdf` extension (callers should not
///   route non-PDF sources here, but the check is defensive);
/// - `page_count` is `None` and the probe cannot determine one;
/// - the determined page count is zero.
///
/// A single-page document gets one marker prepended to the whole text.
/// Otherwise markers are distributed proportionally; see the module docs
/// for the guarantees.
pub fn inject_page_markers(
    markdown: &str,
    source_path: &Path,
    page_count: Option<usize>,
) -> String {
    if !is_pdf_path(source_path) {
        debug!(path = %source_path.display(), "not a PDF, skipping page markers");
        return markdown.to_string();
    }

    let resolved = page_count
        .or_else(|| probe::pdf_page_count_sync(source_path))
        .filter(|&c| c > 0);
    if resolved.is_none() {
        warn!(
            path = %source_path.display(),
            "could not determine page count, skipping page markers"
        );
    }
    splice_markers(markdown, resolved)
}

/// Splice markers for an already-resolved page count; never touches the
/// source file. `None` and zero counts are a no-op.
///
/// Count resolution belongs to the caller: [`inject_page_markers`] probes
/// when it has no explicit count, while the conversion pipeline passes the
/// count from its own earlier probe straight through.
pub(crate) fn splice_markers(markdown: &str, page_count: Option<usize>) -> String {
    let Some(count) = page_count.filter(|&c| c > 0) else {
        return markdown.to_string();
    };

    debug!(pages = count, "injecting page markers");

    if count == 1 {
        let first = PageMarker { offset: 0, page: 1 };
        return format!("{}{}", first.literal(), markdown);
    }

    let total_chars = markdown.chars().count();
    let markers = page_markers(total_chars, count);

    let mut out = String::with_capacity(markdown.len() + markers.len() * 16);
    let mut rest = markdown;
    let mut copied_chars = 0usize;
    for marker in &markers {
        let advance = marker.offset - copied_chars;
        let byte = byte_of_nth_char(rest, advance);
        out.push_str(&rest[..byte]);
        rest = &rest[byte..];
        copied_chars = marker.offset;
        out.push_str(&marker.literal());
        debug!(
            page = marker.page,
            offset = marker.offset,
            percent = percent_of(marker.offset, total_chars),
            "page marker placed"
        );
    }
    out.push_str(rest);

    debug!(markers = markers.len(), "page marker injection complete");
    out
}

/// Byte index of the `nth` character of `s`, or `s.len()` when `nth` is
/// past the end. `nth == 0` is always byte 0.
fn byte_of_nth_char(s: &str, nth: usize) -> usize {
    if nth == 0 {
        return 0;
    }
    s.char_indices().nth(nth).map_or(s.len(), |(i, _)| i)
}

fn percent_of(offset: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        offset as f64 / total as f64 * 100.0
    }
}

/// Whether the path carries a `.pdf` extension (case-insensitive).
pub(crate) fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

// ── Marker scanning helpers ──────────────────────────────────────────────────

static RE_PAGE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"<!-- Page \d+ -->\n").unwrap());

/// Remove every page-boundary marker literal from `text`.
///
/// Exact inverse of injection: stripping the output of
/// [`inject_page_markers`] reconstructs its input. Marker-shaped text that
/// was already present in the source is removed as well.
pub fn strip_page_markers(text: &str) -> String {
    RE_PAGE_MARKER.replace_all(text, "").to_string()
}

/// Count the page-boundary marker literals present in `text`.
pub fn count_page_markers(text: &str) -> usize {
    RE_PAGE_MARKER.find_iter(text).count()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_pdf_passthrough() {
        let md = "# Notes\n\nSome content.";
        let out = inject_page_markers(md, Path::new("notes.txt"), Some(3));
        assert_eq!(out, md);
    }

    #[test]
    fn test_uppercase_extension_is_pdf() {
        let md = "body";
        let out = inject_page_markers(md, Path::new("REPORT.PDF"), Some(1));
        assert_eq!(out, "<!-- Page 1 -->\nbody");
    }

    #[test]
    fn test_zero_page_count_passthrough() {
        let md = "content";
        let out = inject_page_markers(md, Path::new("doc.pdf"), Some(0));
        assert_eq!(out, md);
    }

    #[test]
    fn test_unprobeable_file_passthrough() {
        // No explicit count and the file does not exist, so the probe
        // returns None and injection degrades to identity.
        let md = "content";
        let out = inject_page_markers(md, Path::new("/definitely/not/here.pdf"), None);
        assert_eq!(out, md);
    }

    #[test]
    fn test_explicit_count_skips_probe() {
        // The file does not exist; an explicit count must still inject.
        let out = inject_page_markers("abcdef", Path::new("/definitely/not/here.pdf"), Some(2));
        assert_eq!(count_page_markers(&out), 2);
    }

    #[test]
    fn test_splice_with_resolved_count() {
        // No source path in sight: the splice takes the count as given and
        // cannot fall back to probing.
        let md = "abcdef";
        assert_eq!(splice_markers(md, None), md);
        assert_eq!(splice_markers(md, Some(0)), md);
        assert_eq!(splice_markers(md, Some(1)), format!("<!-- Page 1 -->\n{md}"));
        assert_eq!(count_page_markers(&splice_markers(md, Some(3))), 3);
    }

    #[test]
    fn test_single_page_prepend() {
        let md = "# Title\n\nBody text.";
        let out = inject_page_markers(md, Path::new("doc.pdf"), Some(1));
        assert_eq!(out, format!("<!-- Page 1 -->\n{md}"));
    }

    #[test]
    fn test_single_page_empty_input() {
        let out = inject_page_markers("", Path::new("doc.pdf"), Some(1));
        assert_eq!(out, "<!-- Page 1 -->\n");
    }

    #[test]
    fn test_offsets_1000_chars_4_pages() {
        let markers = page_markers(1000, 4);
        let offsets: Vec<usize> = markers.iter().map(|m| m.offset).collect();
        let pages: Vec<usize> = markers.iter().map(|m| m.page).collect();
        assert_eq!(offsets, vec![0, 250, 500, 750]);
        assert_eq!(pages, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_offsets_floor_division() {
        // 7 chars over 3 pages: floor(0), floor(7/3), floor(14/3).
        let offsets: Vec<usize> = page_markers(7, 3).iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![0, 2, 4]);
    }

    #[test]
    fn test_offsets_monotonic_when_text_shorter_than_pages() {
        let markers = page_markers(5, 10);
        assert_eq!(markers[0].offset, 0);
        for pair in markers.windows(2) {
            assert!(pair[0].offset <= pair[1].offset);
            assert_eq!(pair[0].page + 1, pair[1].page);
        }
    }

    #[test]
    fn test_zero_pages_yields_no_markers() {
        assert!(page_markers(100, 0).is_empty());
    }

    #[test]
    fn test_round_trip_reconstructs_input() {
        let md = "x".repeat(1000);
        let out = inject_page_markers(&md, Path::new("doc.pdf"), Some(4));
        assert_eq!(count_page_markers(&out), 4);
        assert_eq!(strip_page_markers(&out), md);
    }

    #[test]
    fn test_marker_count_matches_page_count() {
        let md = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
                  Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.";
        let out = inject_page_markers(md, Path::new("doc.pdf"), Some(7));
        assert_eq!(count_page_markers(&out), 7);
        assert_eq!(strip_page_markers(&out), md);
    }

    #[test]
    fn test_pages_appear_in_increasing_positions() {
        let md = "a".repeat(300);
        let out = inject_page_markers(&md, Path::new("doc.pdf"), Some(5));
        let mut last = 0;
        for page in 1..=5 {
            let needle = format!("<!-- Page {page} -->\n");
            let pos = out.find(&needle).unwrap_or_else(|| panic!("missing page {page}"));
            assert!(pos >= last, "page {page} out of order");
            last = pos + needle.len();
        }
    }

    #[test]
    fn test_empty_input_multi_page() {
        // All offsets collapse to 0; markers appear consecutively in order.
        let out = inject_page_markers("", Path::new("doc.pdf"), Some(3));
        assert_eq!(out, "<!-- Page 1 -->\n<!-- Page 2 -->\n<!-- Page 3 -->\n");
        assert_eq!(strip_page_markers(&out), "");
    }

    #[test]
    fn test_multibyte_text_not_split() {
        // Three-byte characters throughout; offsets land between characters,
        // never inside one (slicing inside a UTF-8 sequence would panic).
        let md = "日本語のテキストで確認する".repeat(3);
        let out = inject_page_markers(&md, Path::new("doc.pdf"), Some(4));
        assert_eq!(count_page_markers(&out), 4);
        assert_eq!(strip_page_markers(&out), md);
    }

    #[test]
    fn test_output_char_count_invariant() {
        let md = "abcdefghij".repeat(10);
        let count = 4;
        let out = inject_page_markers(&md, Path::new("doc.pdf"), Some(count));
        let marker_chars: usize = page_markers(md.chars().count(), count)
            .iter()
            .map(|m| m.literal().chars().count())
            .sum();
        assert_eq!(out.chars().count(), md.chars().count() + marker_chars);
    }

    #[test]
    fn test_strip_without_markers_is_identity() {
        let md = "plain text, no markers";
        assert_eq!(strip_page_markers(md), md);
        assert_eq!(count_page_markers(md), 0);
    }

    #[test]
    fn test_is_pdf_path() {
        assert!(is_pdf_path(Path::new("a/b/doc.pdf")));
        assert!(is_pdf_path(Path::new("DOC.Pdf")));
        assert!(!is_pdf_path(Path::new("doc.docx")));
        assert!(!is_pdf_path(Path::new("pdf")));
    }

    #[test]
    fn test_byte_of_nth_char() {
        assert_eq!(byte_of_nth_char("abc", 0), 0);
        assert_eq!(byte_of_nth_char("abc", 2), 2);
        assert_eq!(byte_of_nth_char("abc", 3), 3);
        assert_eq!(byte_of_nth_char("abc", 9), 3);
        // 'é' is two bytes.
        assert_eq!(byte_of_nth_char("héllo", 2), 3);
    }
}

//! Page-count probing: structural PDF metadata without rendering.
//!
//! ## Why never fail?
//!
//! The probe exists to feed the marker injector, and the injector's contract
//! is to degrade to a no-op when the count is unknown. A malformed file, an
//! I/O error, or non-PDF content therefore all collapse to `None` here;
//! callers never see a hard error from this module. `lopdf` parses only the
//! cross-reference structure and page tree, so probing stays cheap even for
//! large documents.

use std::path::Path;

use lopdf::{Document, Object};
use tracing::{debug, warn};

use crate::output::PdfInfo;

/// Number of pages in the PDF at `path`, or `None` when it cannot be
/// determined (missing file, parse failure, non-PDF content).
///
/// A structurally valid file can still report zero pages; callers treat
/// zero the same as `None`.
pub fn pdf_page_count_sync(path: &Path) -> Option<usize> {
    match Document::load(path) {
        Ok(doc) => Some(doc.get_pages().len()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not determine PDF page count");
            None
        }
    }
}

/// Async wrapper around [`pdf_page_count_sync`].
///
/// Runs the parse on the blocking pool; a panicked task degrades to `None`
/// like any other probe failure.
pub async fn pdf_page_count(path: &Path) -> Option<usize> {
    let path = path.to_path_buf();
    match tokio::task::spawn_blocking(move || pdf_page_count_sync(&path)).await {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "page-count probe task panicked");
            None
        }
    }
}

/// Structural metadata for the PDF at `path`: page count plus title and
/// author from the trailer `Info` dictionary.
///
/// Same posture as the probe: any failure leaves the affected fields at
/// their defaults rather than erroring.
pub async fn pdf_info(path: &Path) -> PdfInfo {
    let path = path.to_path_buf();
    match tokio::task::spawn_blocking(move || pdf_info_blocking(&path)).await {
        Ok(info) => info,
        Err(e) => {
            warn!(error = %e, "pdf-info task panicked");
            PdfInfo::default()
        }
    }
}

fn pdf_info_blocking(path: &Path) -> PdfInfo {
    let mut info = PdfInfo {
        path: path.to_path_buf(),
        ..PdfInfo::default()
    };

    let Ok(doc) = Document::load(path) else {
        debug!(path = %path.display(), "failed to load PDF for inspection");
        return info;
    };
    info.page_count = Some(doc.get_pages().len());

    let info_obj = doc.trailer.get(b"Info").ok().and_then(|obj| match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    });
    let Some(Object::Dictionary(dict)) = info_obj else {
        debug!(path = %path.display(), "no Info dictionary in PDF");
        return info;
    };

    let get_string = |key: &[u8]| -> Option<String> {
        dict.get(key).ok().and_then(|obj| match obj {
            // Try UTF-8 first, then fall back to Latin-1.
            Object::String(bytes, _) => String::from_utf8(bytes.clone())
                .ok()
                .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
                .filter(|s| !s.trim().is_empty()),
            _ => None,
        })
    };

    info.title = get_string(b"Title");
    info.author = get_string(b"Author");
    info
}

/// Build a minimal but structurally valid PDF with the given number of
/// pages and optional Info entries. Test fixture shared across the crate.
#[cfg(test)]
pub(crate) fn write_test_pdf(
    path: &Path,
    pages: usize,
    title: Option<&str>,
    author: Option<&str>,
) {
    use lopdf::dictionary;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if title.is_some() || author.is_some() {
        let mut info = lopdf::Dictionary::new();
        if let Some(t) = title {
            info.set("Title", Object::string_literal(t));
        }
        if let Some(a) = author {
            info.set("Author", Object::string_literal(a));
        }
        let info_id = doc.add_object(Object::Dictionary(info));
        doc.trailer.set("Info", info_id);
    }

    doc.save(path).unwrap();
}

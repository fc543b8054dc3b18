//! Content-type classification
//!
//! Rules are applied in a fixed order; the first match wins:
//!
//! 1. `image/*` MIME type
//! 2. HTML by name or by content sniffing
//! 3. Mermaid by name
//! 4. CSV by name or by content sniffing
//! 5. text by MIME type or known extension
//! 6. binary

use crate::types::{extension_of, Category, FileAttachment};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Extensions treated as plain text when no earlier rule matched
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "json", "csv", "md", "log", "html", "htm", "css", "js"];

static HTML_PROLOGUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:<!doctype\s+html|<html\b)").expect("valid regex"));
static BODY_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body\b[^>]*>.*</body\s*>").expect("valid regex"));
static HEAD_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<head\b[^>]*>.*</head\s*>").expect("valid regex"));

/// Classify an attachment from its name, MIME type and decoded content.
///
/// Pure and idempotent. `content` is the decoded text, when available.
pub fn classify(name: &str, mime_type: Option<&str>, content: Option<&str>) -> Category {
    let category = if mime_type.is_some_and(|m| m.starts_with("image/")) {
        Category::Image
    } else if is_html_file(name) || content.is_some_and(looks_like_html) {
        Category::Html
    } else if is_mermaid_file(name) {
        Category::Mermaid
    } else if is_csv_file(name) || content.is_some_and(looks_like_csv) {
        Category::Csv
    } else if is_text_based(name, mime_type) {
        Category::Text
    } else {
        Category::Binary
    };

    debug!(name, ?mime_type, ?category, "classified attachment");
    category
}

/// Classify an attachment, decoding its content only for the sniffing rules
pub fn classify_attachment(file: &FileAttachment) -> Category {
    let mime_type = file.mime_type.as_deref();
    if mime_type.is_some_and(|m| m.starts_with("image/")) {
        return Category::Image;
    }
    let content = file.decode_text_lossy();
    classify(&file.name, mime_type, content.as_deref())
}

pub fn is_html_file(name: &str) -> bool {
    has_extension(name, &["html", "htm"])
}

pub fn is_mermaid_file(name: &str) -> bool {
    has_extension(name, &["mermaid", "mmd"])
}

pub fn is_csv_file(name: &str) -> bool {
    has_extension(name, &["csv"])
}

/// Whether the side panel can host a preview for this file name
pub fn is_previewable(name: &str) -> bool {
    is_html_file(name)
}

/// Text MIME type or a known plain-text extension
pub fn is_text_based(name: &str, mime_type: Option<&str>) -> bool {
    mime_type.is_some_and(|m| m.starts_with("text/")) || has_extension(name, TEXT_EXTENSIONS)
}

/// Document prologue, or a complete `<body>` or `<head>` element
pub fn looks_like_html(content: &str) -> bool {
    HTML_PROLOGUE.is_match(content) || BODY_PAIR.is_match(content) || HEAD_PAIR.is_match(content)
}

/// Comma present, at least two lines, and every non-blank line has the
/// same column count as the first line.
///
/// Uniform comma-separated prose is accepted too; this sniff is deliberately naive.
pub fn looks_like_csv(content: &str) -> bool {
    if !content.contains(',') {
        return false;
    }
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 2 {
        return false;
    }
    let columns = lines[0].split(',').count();
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .all(|line| line.split(',').count() == columns)
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    extension_of(name).is_some_and(|ext| extensions.contains(&ext.as_str()))
}

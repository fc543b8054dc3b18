//! File preview subsystem
//!
//! This module provides:
//! - Content-type classification of attachments
//! - Renderer dispatch (image, sandbox, table, text, download-only)
//! - Sandboxed HTML/Mermaid documents and their run toggle
//! - Downloads through revocable object URLs

mod classifier;
pub mod csv;
mod display;
mod download;
pub mod html;
pub mod render;
mod runner;

pub use classifier::{
    classify, classify_attachment, is_csv_file, is_html_file, is_mermaid_file, is_previewable,
    is_text_based, looks_like_csv, looks_like_html, TEXT_EXTENSIONS,
};
pub use csv::{CsvTable, EMPTY_TABLE_MESSAGE};
pub use display::{FileDisplay, FileRow};
pub use download::{download, Blob, BlobRegistry, DirectorySink, FileSink, ObjectUrl, SaveSink};
pub use html::{CdnMermaidRenderer, DiagramRenderer, SandboxDocument, SandboxKind, SANDBOX_POLICY};
pub use render::{render, render_with, ImageSurface, RenderContext, Rendered};
pub use runner::{FrameHost, FrameId, InlineRunners, PreviewRunner};

#[cfg(test)]
pub(crate) use runner::testing;

//! Attachment display layout inside a message bubble

use super::classifier::{classify_attachment, is_previewable};
use super::render::{render_with, RenderContext, Rendered};
use super::DiagramRenderer;
use crate::types::{Category, FileAttachment};

/// Filename row with its actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub file_name: String,
    pub can_download: bool,
    /// Offered only for side-panel previewable files when a handler exists
    pub can_preview: bool,
    /// Inline run toggle for HTML and Mermaid content
    pub can_run: bool,
}

/// How an attachment is laid out in the message list
#[derive(Debug, Clone, PartialEq)]
pub enum FileDisplay {
    /// Image surface above the file row
    Image { rendered: Rendered, row: FileRow },
    /// Inline preview content with the row's actions
    Inline {
        category: Category,
        rendered: Rendered,
        row: FileRow,
    },
    /// Only the file row
    Row(FileRow),
}

impl FileDisplay {
    /// Lay out `file`. `has_preview_handler` mirrors whether the parent
    /// supplied an `on_preview_file` callback.
    pub fn for_attachment(
        file: &FileAttachment,
        has_preview_handler: bool,
        cx: &RenderContext,
        diagrams: &dyn DiagramRenderer,
    ) -> Self {
        let category = classify_attachment(file);
        let row = FileRow {
            file_name: file.name.clone(),
            can_download: true,
            can_preview: has_preview_handler && is_previewable(&file.name),
            can_run: category.is_sandboxed(),
        };

        match category {
            Category::Image => Self::Image {
                rendered: render_with(file, Category::Image, cx, diagrams),
                row,
            },
            Category::Binary => Self::Row(row),
            category => Self::Inline {
                category,
                rendered: render_with(file, category, cx, diagrams),
                row,
            },
        }
    }

    pub fn row(&self) -> &FileRow {
        match self {
            Self::Image { row, .. } | Self::Inline { row, .. } | Self::Row(row) => row,
        }
    }
}

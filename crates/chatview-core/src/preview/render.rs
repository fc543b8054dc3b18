//! Renderer dispatch: classified attachment → renderable output
//!
//! Rendering never fails. Undecodable content turns into
//! [`Rendered::Unreadable`] and an empty CSV into [`Rendered::Empty`].

use super::csv::{self, CsvTable, EMPTY_TABLE_MESSAGE};
use super::html::{CdnMermaidRenderer, DiagramRenderer, SandboxDocument};
use crate::types::{Category, FileAttachment};
use std::sync::Arc;
use tracing::warn;

/// Fraction of the viewport an inline image may take
pub const IMAGE_VIEWPORT_FRACTION: f32 = 0.85;

/// Fixed width cap for inline images
pub const DEFAULT_IMAGE_MAX_WIDTH: f32 = 448.0;

/// Geometry the output is rendered for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub panel_width: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub image_max_width: f32,
}

impl RenderContext {
    pub fn new(panel_width: f32, viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            panel_width,
            viewport_width,
            viewport_height,
            image_max_width: DEFAULT_IMAGE_MAX_WIDTH,
        }
    }

    pub fn with_image_max_width(mut self, image_max_width: f32) -> Self {
        self.image_max_width = image_max_width;
        self
    }

    /// `min(85vw, cap)`
    pub fn image_width(&self) -> f32 {
        (self.viewport_width * IMAGE_VIEWPORT_FRACTION).min(self.image_max_width)
    }
}

/// Decoded image ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSurface {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
    pub max_width: f32,
}

/// Output of the dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Image(ImageSurface),
    /// HTML or Mermaid; only shown live while the run toggle is on
    Sandbox {
        document: SandboxDocument,
        /// Decoded source, shown while the preview is stopped
        source: String,
    },
    Table(CsvTable),
    Empty { message: &'static str },
    /// Preformatted, whitespace-preserving text
    Text(String),
    DownloadOnly { file_name: String },
    Unreadable { file_name: String, reason: String },
}

impl Rendered {
    pub fn is_sandboxed(&self) -> bool {
        matches!(self, Self::Sandbox { .. })
    }
}

/// Dispatch with the default CDN diagram renderer
pub fn render(file: &FileAttachment, category: Category, cx: &RenderContext) -> Rendered {
    render_with(file, category, cx, &CdnMermaidRenderer::default())
}

/// Dispatch on `category`
pub fn render_with(
    file: &FileAttachment,
    category: Category,
    cx: &RenderContext,
    diagrams: &dyn DiagramRenderer,
) -> Rendered {
    match category {
        Category::Image => match file.decode_bytes() {
            Ok(bytes) => Rendered::Image(ImageSurface {
                file_name: file.name.clone(),
                mime_type: file.blob_mime_type().to_string(),
                bytes: bytes.into(),
                max_width: cx.image_width(),
            }),
            Err(e) => unreadable(file, e),
        },
        Category::Binary => Rendered::DownloadOnly {
            file_name: file.name.clone(),
        },
        Category::Html | Category::Mermaid | Category::Csv | Category::Text => {
            let text = match file.decode_bytes() {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => return unreadable(file, e),
            };
            render_text(category, text, cx, diagrams)
        }
    }
}

fn render_text(
    category: Category,
    text: String,
    cx: &RenderContext,
    diagrams: &dyn DiagramRenderer,
) -> Rendered {
    match category {
        Category::Html => Rendered::Sandbox {
            document: SandboxDocument::from_html(&text, cx.panel_width, cx.viewport_height),
            source: text,
        },
        Category::Mermaid => Rendered::Sandbox {
            document: SandboxDocument::from_diagram(
                diagrams,
                &text,
                cx.panel_width,
                cx.viewport_height,
            ),
            source: text,
        },
        Category::Csv => match csv::parse(&text) {
            Some(table) => Rendered::Table(table),
            None => Rendered::Empty {
                message: EMPTY_TABLE_MESSAGE,
            },
        },
        _ => Rendered::Text(text),
    }
}

fn unreadable(file: &FileAttachment, err: crate::Error) -> Rendered {
    warn!(name = %file.name, error = %err, "attachment could not be decoded");
    Rendered::Unreadable {
        file_name: file.name.clone(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::classify_attachment;
    use crate::preview::html::SandboxKind;
    use pretty_assertions::assert_eq;

    fn cx() -> RenderContext {
        RenderContext::new(500.0, 1000.0, 800.0)
    }

    fn render_file(file: &FileAttachment) -> Rendered {
        render(file, classify_attachment(file), &cx())
    }

    #[test]
    fn test_csv_table() {
        let file = FileAttachment::from_bytes("t.csv", b"a,b\n1,2\n3,4", None);
        let Rendered::Table(table) = render_file(&file) else {
            panic!("expected table");
        };
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_blank_csv_is_empty_state() {
        for content in ["", "   ", " \n\t \n"] {
            let file = FileAttachment::from_bytes("t.csv", content.as_bytes(), None);
            assert_eq!(
                render_file(&file),
                Rendered::Empty {
                    message: EMPTY_TABLE_MESSAGE
                }
            );
        }
    }

    #[test]
    fn test_image_surface_width() {
        let file = FileAttachment::from_bytes("p.png", &[0x89, 0x50], Some("image/png".to_string()));
        let Rendered::Image(surface) = render_file(&file) else {
            panic!("expected image");
        };
        assert_eq!(surface.max_width, 448.0);
        assert_eq!(&*surface.bytes, &[0x89, 0x50]);

        let narrow = RenderContext::new(300.0, 400.0, 800.0);
        let Rendered::Image(surface) = render(&file, Category::Image, &narrow) else {
            panic!("expected image");
        };
        assert_eq!(surface.max_width, 340.0);
    }

    #[test]
    fn test_html_and_mermaid_are_sandboxed() {
        let html = FileAttachment::from_bytes("p.html", b"<script>let a = 1;</script>", None);
        let Rendered::Sandbox { document, source } = render_file(&html) else {
            panic!("expected sandbox");
        };
        assert_eq!(document.kind, SandboxKind::Html);
        assert_eq!(document.max_width, 500.0);
        assert!(document.html.contains("(function() {"));
        assert_eq!(source, "<script>let a = 1;</script>");

        let mmd = FileAttachment::from_bytes("d.mmd", b"graph LR; A-->B", None);
        let rendered = render_file(&mmd);
        assert!(rendered.is_sandboxed());
    }

    #[test]
    fn test_text_preserves_whitespace() {
        let file = FileAttachment::from_bytes("log.txt", b"  indented\n\ttabbed\n", None);
        assert_eq!(render_file(&file), Rendered::Text("  indented\n\ttabbed\n".to_string()));
    }

    #[test]
    fn test_binary_is_download_only() {
        let file = FileAttachment::from_bytes("a.zip", &[0, 1, 2], Some("application/zip".to_string()));
        assert_eq!(
            render_file(&file),
            Rendered::DownloadOnly {
                file_name: "a.zip".to_string()
            }
        );
    }

    #[test]
    fn test_bad_base64_degrades() {
        let file = FileAttachment::new("a.txt", "!!!", None);
        assert!(matches!(render(&file, Category::Text, &cx()), Rendered::Unreadable { .. }));
    }
}

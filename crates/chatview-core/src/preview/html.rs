//! Sandboxed HTML and Mermaid documents

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

/// Frame sandbox tokens: scripts run, navigation outside the frame is denied
pub const SANDBOX_POLICY: &str = "allow-scripts";

/// Vertical space reserved around a sandbox frame
pub const FRAME_HEIGHT_OFFSET: f32 = 200.0;

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("valid regex")
});
static SRC_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsrc\s*=").expect("valid regex"));
static TYPE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\btype\s*=\s*["']?([^"'\s>]+)"#).expect("valid regex")
});

/// What kind of content a sandbox document was built from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SandboxKind {
    Html,
    Mermaid,
}

/// A complete document ready to be loaded into an isolated frame
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SandboxDocument {
    pub kind: SandboxKind,
    pub html: String,
    pub policy: &'static str,
    /// Frame is never wider than the hosting panel
    pub max_width: f32,
    pub height: f32,
}

impl SandboxDocument {
    /// Build a document from user HTML, isolating each inline script
    pub fn from_html(content: &str, max_width: f32, viewport_height: f32) -> Self {
        Self {
            kind: SandboxKind::Html,
            html: isolate_inline_scripts(content),
            policy: SANDBOX_POLICY,
            max_width,
            height: frame_height(viewport_height),
        }
    }

    /// Build a document from diagram source through a renderer
    pub fn from_diagram(
        renderer: &dyn DiagramRenderer,
        source: &str,
        max_width: f32,
        viewport_height: f32,
    ) -> Self {
        Self {
            kind: SandboxKind::Mermaid,
            html: renderer.render_diagram(source),
            policy: SANDBOX_POLICY,
            max_width,
            height: frame_height(viewport_height),
        }
    }
}

fn frame_height(viewport_height: f32) -> f32 {
    (viewport_height - FRAME_HEIGHT_OFFSET).max(0.0)
}

/// Rewrite every inline `<script>` body to run inside an immediately-invoked
/// function so top-level declarations stay local to that block.
///
/// External scripts (`src=`) and non-JavaScript script types are left alone.
pub fn isolate_inline_scripts(html: &str) -> String {
    SCRIPT_BLOCK
        .replace_all(html, |caps: &Captures| {
            let attrs = &caps[1];
            let body = &caps[2];
            if SRC_ATTR.is_match(attrs) || body.trim().is_empty() || !is_javascript_type(attrs) {
                return caps[0].to_string();
            }
            format!("<script{attrs}>(function() {{\n{body}\n}})();</script>")
        })
        .into_owned()
}

fn is_javascript_type(attrs: &str) -> bool {
    match TYPE_ATTR.captures(attrs) {
        None => true,
        Some(caps) => {
            let ty = caps[1].to_ascii_lowercase();
            ty == "text/javascript" || ty == "application/javascript"
        }
    }
}

/// Escape text for placement inside an HTML element
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Turns diagram source into a self-contained document with pan/zoom controls.
///
/// The document must expose buttons with ids `zoom-in`, `zoom-out` and `reset`.
pub trait DiagramRenderer: Send + Sync {
    fn render_diagram(&self, source: &str) -> String;
}

/// Renders Mermaid source with the Mermaid and svg-pan-zoom libraries from a CDN
#[derive(Debug, Clone)]
pub struct CdnMermaidRenderer {
    pub mermaid_url: String,
    pub pan_zoom_url: String,
}

impl Default for CdnMermaidRenderer {
    fn default() -> Self {
        Self {
            mermaid_url: "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js".to_string(),
            pan_zoom_url: "https://cdn.jsdelivr.net/npm/svg-pan-zoom@3.6.1/dist/svg-pan-zoom.min.js"
                .to_string(),
        }
    }
}

impl DiagramRenderer for CdnMermaidRenderer {
    fn render_diagram(&self, source: &str) -> String {
        MERMAID_TEMPLATE
            .replace("{{MERMAID_URL}}", &escape_html(&self.mermaid_url))
            .replace("{{PAN_ZOOM_URL}}", &escape_html(&self.pan_zoom_url))
            .replace("{{SOURCE}}", &escape_html(source))
    }
}

const MERMAID_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <script src="{{MERMAID_URL}}"></script>
  <script src="{{PAN_ZOOM_URL}}"></script>
  <style>
    html, body { margin: 0; height: 100%; overflow: hidden; background: #fff; }
    #diagram { width: 100%; height: 100%; }
    #diagram svg { width: 100%; height: 100%; max-width: none !important; }
    .controls { position: fixed; top: 8px; right: 8px; display: flex; gap: 4px; z-index: 10; }
    .controls button { padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; background: #f7f7f7; cursor: pointer; }
  </style>
</head>
<body>
  <div class="controls">
    <button id="zoom-in" title="Zoom in">+</button>
    <button id="zoom-out" title="Zoom out">&minus;</button>
    <button id="reset" title="Reset">Reset</button>
  </div>
  <div id="diagram"><pre class="mermaid">{{SOURCE}}</pre></div>
  <script>
    mermaid.initialize({ startOnLoad: false, securityLevel: 'strict' });
    window.addEventListener('load', function () {
      mermaid.run({ querySelector: '.mermaid' }).then(function () {
        var svg = document.querySelector('#diagram svg');
        if (!svg) { return; }
        var panZoom = svgPanZoom(svg, { zoomEnabled: true, controlIconsEnabled: false, fit: true, center: true });
        document.getElementById('zoom-in').addEventListener('click', function () { panZoom.zoomIn(); });
        document.getElementById('zoom-out').addEventListener('click', function () { panZoom.zoomOut(); });
        document.getElementById('reset').addEventListener('click', function () { panZoom.resetZoom(); panZoom.center(); });
      });
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_scripts_are_wrapped() {
        let html = "<p>x</p><script>var count = 1;</script><SCRIPT type=\"text/javascript\">let y = 2;</SCRIPT>";
        let out = isolate_inline_scripts(html);
        assert!(out.contains("<script>(function() {\nvar count = 1;\n})();</script>"));
        assert!(out.contains("<script type=\"text/javascript\">(function() {\nlet y = 2;\n})();</script>"));
        assert!(out.starts_with("<p>x</p>"));
    }

    #[test]
    fn test_external_and_data_scripts_untouched() {
        let html = r#"<script src="lib.js"></script><script type="application/json">{"a":1}</script><script></script>"#;
        assert_eq!(isolate_inline_scripts(html), html);
    }

    #[test]
    fn test_html_document_geometry() {
        let doc = SandboxDocument::from_html("<html></html>", 420.0, 900.0);
        assert_eq!(doc.kind, SandboxKind::Html);
        assert_eq!(doc.policy, "allow-scripts");
        assert_eq!(doc.max_width, 420.0);
        assert_eq!(doc.height, 700.0);

        let tiny = SandboxDocument::from_html("", 300.0, 100.0);
        assert_eq!(tiny.height, 0.0);
    }

    #[test]
    fn test_mermaid_template() {
        let renderer = CdnMermaidRenderer::default();
        let doc = SandboxDocument::from_diagram(&renderer, "graph TD; A-->B", 400.0, 800.0);
        assert_eq!(doc.kind, SandboxKind::Mermaid);
        for id in ["id=\"zoom-in\"", "id=\"zoom-out\"", "id=\"reset\""] {
            assert!(doc.html.contains(id), "missing {id}");
        }
        assert!(doc.html.contains("graph TD; A--&gt;B"));
        assert!(doc.html.contains("cdn.jsdelivr.net/npm/mermaid"));
        assert!(doc.html.contains("svg-pan-zoom"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href='x'>&</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&lt;/a&gt;");
    }
}

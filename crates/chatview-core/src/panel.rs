//! Resizable preview panel
//!
//! State machine over [`PanelPhase`]:
//!
//! ```text
//!   Closed ──open(file)──▶ OpenStatic ──pointer down on handle──▶ OpenResizing
//!     ▲                       │  ▲                                   │
//!     └──────── close ────────┘  └──────── pointer up (window) ──────┘
//! ```
//!
//! Window-level listeners are attached only while resizing and released on
//! every exit path: pointer up, close, reopen and drop.

use crate::preview::{
    classify_attachment, render_with, CdnMermaidRenderer, DiagramRenderer, FrameHost,
    PreviewRunner, RenderContext, Rendered,
};
use crate::types::{Category, FileAttachment};
use tracing::debug;

pub const MIN_PANEL_WIDTH: f32 = 300.0;
pub const MAX_PANEL_FRACTION: f32 = 0.7;
pub const DEFAULT_PANEL_WIDTH: f32 = 400.0;

/// Document class that suppresses text selection during a drag
pub const RESIZE_BODY_CLASS: &str = "resize-active";

/// Clamp a panel width to `[300, 0.7 × viewport_width]`.
///
/// On viewports narrower than `300 / 0.7` the minimum wins.
pub fn clamp_width(width: f32, viewport_width: f32) -> f32 {
    width.min(viewport_width * MAX_PANEL_FRACTION).max(MIN_PANEL_WIDTH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Closed,
    OpenStatic,
    OpenResizing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    pub width_px: f32,
    pub is_resizing: bool,
    pub is_rendering_preview: bool,
}

/// Window-level event plumbing the panel drives during a drag
pub trait DragHost {
    /// Start delivering pointer move/up events from anywhere in the window
    fn attach_window_listeners(&mut self);
    fn detach_window_listeners(&mut self);
    fn set_body_class(&mut self, class: &str, enabled: bool);
}

/// The file currently shown in the panel, decoded once at open time
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPreview {
    pub file: FileAttachment,
    pub category: Category,
    pub rendered: Rendered,
}

type CloseCallback = Box<dyn FnMut()>;

pub struct PreviewPanel<H: DragHost, F: FrameHost> {
    drag: H,
    runner: PreviewRunner<F>,
    diagrams: Box<dyn DiagramRenderer>,
    phase: PanelPhase,
    state: PanelState,
    default_width: f32,
    viewport_width: f32,
    viewport_height: f32,
    preview: Option<OpenPreview>,
    on_close: Option<CloseCallback>,
}

impl<H: DragHost, F: FrameHost> PreviewPanel<H, F> {
    pub fn new(drag: H, frames: F, default_width: f32, auto_run: bool) -> Self {
        Self {
            drag,
            runner: PreviewRunner::new(frames, auto_run),
            diagrams: Box::new(CdnMermaidRenderer::default()),
            phase: PanelPhase::Closed,
            state: PanelState {
                width_px: default_width,
                is_resizing: false,
                is_rendering_preview: false,
            },
            default_width,
            viewport_width: 0.0,
            viewport_height: 0.0,
            preview: None,
            on_close: None,
        }
    }

    pub fn with_diagram_renderer(mut self, renderer: impl DiagramRenderer + 'static) -> Self {
        self.diagrams = Box::new(renderer);
        self
    }

    /// Invoked after the panel has been dismissed
    pub fn on_close(&mut self, callback: impl FnMut() + 'static) {
        self.on_close = Some(Box::new(callback));
    }

    /// Handle a "preview requested" event
    pub fn open(&mut self, file: FileAttachment, viewport_width: f32, viewport_height: f32) {
        self.end_resize();
        self.viewport_width = viewport_width;
        self.viewport_height = viewport_height;
        self.state.width_px = clamp_width(self.default_width, viewport_width);

        let category = classify_attachment(&file);
        let cx = RenderContext::new(self.state.width_px, viewport_width, viewport_height);
        let rendered = render_with(&file, category, &cx, self.diagrams.as_ref());

        // Each opened file starts from the configured run state
        self.runner.clear();
        if let Rendered::Sandbox { document, .. } = &rendered {
            self.runner.load(document.clone());
        }

        debug!(name = %file.name, ?category, width = self.state.width_px, "preview panel opened");
        self.preview = Some(OpenPreview {
            file,
            category,
            rendered,
        });
        self.phase = PanelPhase::OpenStatic;
        self.sync_rendering_flag();
    }

    /// Pointer down on the left edge handle
    pub fn pointer_down_on_handle(&mut self) {
        if self.phase != PanelPhase::OpenStatic {
            return;
        }
        self.phase = PanelPhase::OpenResizing;
        self.state.is_resizing = true;
        self.drag.set_body_class(RESIZE_BODY_CLASS, true);
        self.drag.attach_window_listeners();
        debug!("panel resize started");
    }

    /// Window-level pointer move; the panel's left edge follows the pointer
    pub fn pointer_move(&mut self, pointer_x: f32, viewport_width: f32) {
        if self.phase != PanelPhase::OpenResizing {
            return;
        }
        self.viewport_width = viewport_width;
        self.state.width_px = clamp_width(viewport_width - pointer_x, viewport_width);
    }

    /// Window-level pointer up
    pub fn pointer_up(&mut self) {
        if self.phase != PanelPhase::OpenResizing {
            return;
        }
        self.end_resize();
        self.phase = PanelPhase::OpenStatic;
        debug!(width = self.state.width_px, "panel resize finished");
    }

    /// The window was resized
    pub fn resize_viewport(&mut self, viewport_width: f32, viewport_height: f32) {
        self.viewport_width = viewport_width;
        self.viewport_height = viewport_height;
        if self.phase != PanelPhase::Closed {
            self.state.width_px = clamp_width(self.state.width_px, viewport_width);
        }
    }

    /// Flip the sandbox run toggle; returns whether it is now running
    pub fn toggle_run(&mut self) -> bool {
        let running = self.runner.toggle();
        self.sync_rendering_flag();
        running
    }

    /// Explicit close action
    pub fn close(&mut self) {
        if self.phase == PanelPhase::Closed {
            return;
        }
        self.end_resize();
        self.runner.clear();
        self.preview = None;
        self.phase = PanelPhase::Closed;
        self.sync_rendering_flag();
        debug!("preview panel closed");

        if let Some(callback) = self.on_close.as_mut() {
            callback();
        }
    }

    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.phase != PanelPhase::Closed
    }

    pub fn preview(&self) -> Option<&OpenPreview> {
        self.preview.as_ref()
    }

    /// Header title, `Preview: {name}`
    pub fn title(&self) -> Option<String> {
        self.preview
            .as_ref()
            .map(|p| format!("Preview: {}", p.file.name))
    }

    pub fn runner(&self) -> &PreviewRunner<F> {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut PreviewRunner<F> {
        &mut self.runner
    }

    pub fn drag_host(&self) -> &H {
        &self.drag
    }

    pub fn drag_host_mut(&mut self) -> &mut H {
        &mut self.drag
    }

    fn end_resize(&mut self) {
        if self.state.is_resizing {
            self.state.is_resizing = false;
            self.drag.detach_window_listeners();
            self.drag.set_body_class(RESIZE_BODY_CLASS, false);
        }
    }

    fn sync_rendering_flag(&mut self) {
        self.state.is_rendering_preview = self.runner.frame().is_some();
    }
}

impl<H: DragHost, F: FrameHost> Drop for PreviewPanel<H, F> {
    fn drop(&mut self) {
        self.end_resize();
    }
}

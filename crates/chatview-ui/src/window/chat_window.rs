//! Main Chatview window
//!
//! - Status banner above the transcript
//! - Message list with inline attachment previews
//! - Resizable preview panel on the right edge

use chatview_core::preview::{download, CsvTable, FileDisplay, FileRow, FileSink, RenderContext};
use chatview_core::status::Transition;
use chatview_core::store::{keys, StoreEvent};
use chatview_core::{
    AppConfig, AuthScreen, BlobRegistry, CdnMermaidRenderer, ChatMessage, FileAttachment,
    InlineRunners, KeyValueStore, MessageList, MessageView, PreviewPanel, Rendered, Role,
    StatusBanner, StatusLog, Subscription as StoreSubscription,
};
use chatview_ui::{
    layout, ImageCache, PreviewServer, ServedFrameHost, Theme, ThemeColors, Transcript, WindowDragHost,
};
use gpui::prelude::FluentBuilder;
use gpui::*;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Length of a bot message's reveal fade
const REVEAL_MS: u64 = 400;

/// Attachment position inside the transcript
type AttachmentRef = (usize, usize);

// ============================================================================
// Window State
// ============================================================================

pub struct ChatWindow {
    theme: Theme,
    config: AppConfig,
    store: Arc<dyn KeyValueStore>,
    /// Set by the store listener when the theme key changes
    theme_dirty: Arc<AtomicBool>,
    _theme_subscription: StoreSubscription,
    system_prefers_dark: bool,
    /// Shown instead of the chat until dismissed
    auth_screen: Option<AuthScreen>,
    messages: Vec<ChatMessage>,
    message_list: MessageList,
    status_log: StatusLog,
    /// Reveal fade start per message index
    revealing: HashMap<usize, Instant>,
    panel: PreviewPanel<WindowDragHost, ServedFrameHost>,
    /// Run toggles for HTML and Mermaid attachments in the message list
    inline_runs: InlineRunners<AttachmentRef, ServedFrameHost>,
    /// Attachment currently open in the panel; cleared by the panel's close hook
    previewing: Rc<Cell<Option<AttachmentRef>>>,
    blobs: BlobRegistry,
    images: ImageCache,
    diagrams: CdnMermaidRenderer,
    message_scroll_handle: ScrollHandle,
    focus_handle: FocusHandle,
    viewport: (f32, f32),
    /// Serves sandbox frames; shut down with the window
    _preview_server: PreviewServer,
}

impl ChatWindow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cx: &mut ViewContext<Self>,
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        transcript: Transcript,
        auth_screen: Option<AuthScreen>,
        cache_dir: PathBuf,
        preview_server: PreviewServer,
    ) -> Self {
        let system_prefers_dark = matches!(
            cx.window_appearance(),
            WindowAppearance::Dark | WindowAppearance::VibrantDark
        );
        let theme = Theme::resolve(store.as_ref(), config.theme, system_prefers_dark);

        let theme_dirty = Arc::new(AtomicBool::new(false));
        let flag = theme_dirty.clone();
        let theme_subscription = store.subscribe(Arc::new(move |event: &StoreEvent| {
            if event.key == keys::THEME {
                flag.store(true, Ordering::SeqCst);
            }
        }));

        let previewing: Rc<Cell<Option<AttachmentRef>>> = Rc::new(Cell::new(None));
        let mut panel = PreviewPanel::new(
            WindowDragHost::new(),
            preview_server.frame_host(),
            config.initial_panel_width,
            config.auto_run_previews,
        );
        let closed = previewing.clone();
        panel.on_close(move || closed.set(None));

        let registry = preview_server.registry().clone();
        let base_url = preview_server.base_url().to_string();
        let inline_runs = InlineRunners::new(config.auto_run_previews, move || {
            ServedFrameHost::new(registry.clone(), base_url.clone())
        });

        let mut status_log = StatusLog::new();
        for update in transcript.status_updates {
            status_log.push_message(update);
        }

        // Poll for theme changes and drive fades
        cx.spawn(|view, mut cx| async move {
            loop {
                cx.background_executor()
                    .timer(Duration::from_millis(50))
                    .await;

                let result = view.update(&mut cx, |this, cx| {
                    if this.tick() {
                        cx.notify();
                    }
                    this.open_pending_frames(cx);
                });
                if result.is_err() {
                    break;
                }
            }
        })
        .detach();

        info!(
            messages = transcript.messages.len(),
            dark = theme.is_dark,
            "chat window created"
        );

        Self {
            theme,
            message_list: MessageList::new(true),
            config,
            store,
            theme_dirty,
            _theme_subscription: theme_subscription,
            system_prefers_dark,
            auth_screen,
            messages: transcript.messages,
            status_log,
            revealing: HashMap::new(),
            panel,
            inline_runs,
            previewing,
            blobs: BlobRegistry::new(),
            images: ImageCache::new(cache_dir.join("images")),
            diagrams: CdnMermaidRenderer::default(),
            message_scroll_handle: ScrollHandle::new(),
            focus_handle: cx.focus_handle(),
            viewport: (0.0, 0.0),
            _preview_server: preview_server,
        }
    }

    /// Advance time-based state; returns whether a re-render is needed
    fn tick(&mut self) -> bool {
        let mut dirty = false;

        if self.theme_dirty.swap(false, Ordering::SeqCst) {
            self.theme = Theme::resolve(self.store.as_ref(), self.config.theme, self.system_prefers_dark);
            debug!(dark = self.theme.is_dark, "theme changed");
            dirty = true;
        }

        if !self.revealing.is_empty() {
            let reveal = Duration::from_millis(REVEAL_MS);
            self.revealing.retain(|_, started| started.elapsed() < reveal);
            dirty = true;
        }

        if self.status_log.is_settling(Instant::now()) {
            dirty = true;
        }

        dirty
    }

    // ========================================================================
    // Actions
    // ========================================================================

    fn toggle_theme(&mut self, _cx: &mut ViewContext<Self>) {
        let next = if self.theme.is_dark { "light" } else { "dark" };
        if let Err(e) = self.store.set(keys::THEME, next) {
            warn!("Failed to store theme: {}", e);
        }
    }

    fn attachment(&self, at: AttachmentRef) -> Option<FileAttachment> {
        self.messages
            .get(at.0)
            .and_then(|m| m.attachments.get(at.1))
            .cloned()
    }

    fn preview_attachment(&mut self, at: AttachmentRef, cx: &mut ViewContext<Self>) {
        let Some(file) = self.attachment(at) else {
            return;
        };
        info!(name = %file.name, "opening preview");
        self.panel.open(file, self.viewport.0, self.viewport.1);
        self.previewing.set(Some(at));
        self.open_pending_frames(cx);
        cx.notify();
    }

    fn close_preview(&mut self, cx: &mut ViewContext<Self>) {
        self.panel.close();
        cx.notify();
    }

    fn toggle_preview_run(&mut self, cx: &mut ViewContext<Self>) {
        let running = self.panel.toggle_run();
        debug!(running, "preview run toggled");
        self.open_pending_frames(cx);
        cx.notify();
    }

    fn toggle_inline_run(&mut self, at: AttachmentRef, cx: &mut ViewContext<Self>) {
        let running = self.inline_runs.toggle(at);
        debug!(message = at.0, slot = at.1, running, "inline run toggled");
        self.open_pending_frames(cx);
        cx.notify();
    }

    /// Hand freshly mounted sandbox pages to the system browser
    fn open_pending_frames(&mut self, cx: &mut ViewContext<Self>) {
        let mut urls = self.panel.runner_mut().host_mut().take_pending_opens();
        for host in self.inline_runs.hosts_mut() {
            urls.extend(host.take_pending_opens());
        }
        for url in urls {
            cx.open_url(&url);
        }
    }

    fn download_file(&mut self, file: FileAttachment, cx: &mut ViewContext<Self>) {
        cx.spawn(|view, mut cx| async move {
            let target = rfd::AsyncFileDialog::new()
                .set_title("Save File")
                .set_file_name(file.name.clone())
                .save_file()
                .await;

            if let Some(target) = target {
                let path = target.path().to_path_buf();
                let _ = view.update(&mut cx, |this, cx| {
                    let mut sink = FileSink::new(path);
                    if let Err(e) = download(&file, &this.blobs, &mut sink) {
                        warn!(name = %file.name, "Download failed: {}", e);
                        this.status_log.push_message(format!("Download failed: {}", e));
                    }
                    cx.notify();
                });
            }
        })
        .detach();
    }

    fn download_attachment(&mut self, at: AttachmentRef, cx: &mut ViewContext<Self>) {
        if let Some(file) = self.attachment(at) {
            self.download_file(file, cx);
        }
    }

    fn attach_files(&mut self, cx: &mut ViewContext<Self>) {
        cx.spawn(|view, mut cx| async move {
            let files = rfd::AsyncFileDialog::new()
                .set_title("Attach Files")
                .pick_files()
                .await;

            if let Some(files) = files {
                let _ = view.update(&mut cx, |this, cx| {
                    let mut message = ChatMessage::user(format!("Attached {} file(s)", files.len()));
                    for handle in files {
                        match FileAttachment::from_path(handle.path()) {
                            Ok(file) => message = message.with_attachment(file),
                            Err(e) => {
                                warn!(path = ?handle.path(), "Failed to attach file: {}", e);
                                this.status_log.push_message(format!("Could not attach file: {}", e));
                            }
                        }
                    }
                    if !message.attachments.is_empty() {
                        this.messages.push(message);
                    }
                    cx.notify();
                });
            }
        })
        .detach();
    }

    fn clear_transcript(&mut self, cx: &mut ViewContext<Self>) {
        self.messages.clear();
        self.inline_runs.clear();
        self.panel.close();
        cx.notify();
    }

    fn dismiss_status(&mut self, cx: &mut ViewContext<Self>) {
        self.status_log.dismiss();
        cx.notify();
    }

    fn toggle_status_history(&mut self, cx: &mut ViewContext<Self>) {
        self.status_log.toggle_expanded();
        cx.notify();
    }

    fn on_pointer_move(&mut self, event: &MouseMoveEvent, cx: &mut ViewContext<Self>) {
        if !self.panel.drag_host().is_listening() {
            return;
        }
        let before = self.panel.state().width_px;
        self.panel.pointer_move(f32::from(event.position.x), self.viewport.0);
        if (self.panel.state().width_px - before).abs() > 0.5 {
            cx.notify();
        }
    }

    fn on_pointer_up(&mut self, cx: &mut ViewContext<Self>) {
        if self.panel.drag_host().is_listening() {
            self.panel.pointer_up();
            cx.notify();
        }
    }

    fn sync_viewport(&mut self, cx: &mut ViewContext<Self>) {
        let size = cx.viewport_size();
        let viewport = (f32::from(size.width), f32::from(size.height));
        if viewport != self.viewport {
            self.viewport = viewport;
            self.panel.resize_viewport(viewport.0, viewport.1);
        }
    }

    // ========================================================================
    // Auth Screen
    // ========================================================================

    fn render_auth_screen(&self, screen: &AuthScreen, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let colors = &self.theme.colors;

        div()
            .size_full()
            .flex()
            .items_center()
            .justify_center()
            .bg(rgb(colors.background))
            .child(
                div()
                    .flex()
                    .flex_col()
                    .items_center()
                    .gap(px(16.0))
                    .p(px(32.0))
                    .max_w(px(512.0))
                    .child(
                        div()
                            .text_xl()
                            .text_color(rgb(colors.text_primary))
                            .child(screen.title().to_string()),
                    )
                    .when_some(screen.detail(), |el, detail| {
                        el.child(div().text_color(rgb(colors.error)).child(detail.to_string()))
                    })
                    .when_some(screen.action_label(), |el, label| {
                        el.child(
                            div()
                                .id("auth-continue")
                                .px(px(24.0))
                                .py(px(8.0))
                                .rounded(px(layout::BORDER_RADIUS_SM))
                                .bg(rgb(colors.primary))
                                .hover(|s| s.bg(rgb(colors.primary_hover)))
                                .text_color(rgb(colors.text_on_primary))
                                .cursor_pointer()
                                .on_click(cx.listener(|this, _, cx| {
                                    this.auth_screen = None;
                                    cx.notify();
                                }))
                                .child(label),
                        )
                    }),
            )
    }

    // ========================================================================
    // Header + Status Banner
    // ========================================================================

    fn render_header(&self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let colors = &self.theme.colors;

        div()
            .flex()
            .flex_row()
            .items_center()
            .justify_between()
            .px(px(16.0))
            .py(px(8.0))
            .border_b_1()
            .border_color(rgb(colors.border))
            .child(
                div()
                    .text_color(rgb(colors.text_primary))
                    .font_weight(FontWeight::MEDIUM)
                    .child("Chatview"),
            )
            .child(
                div()
                    .flex()
                    .gap(px(8.0))
                    .child(header_button("attach-files", "Attach file", colors).on_click(
                        cx.listener(|this, _, cx| this.attach_files(cx)),
                    ))
                    .child(header_button("clear-transcript", "Clear", colors).on_click(
                        cx.listener(|this, _, cx| this.clear_transcript(cx)),
                    ))
                    .child(
                        header_button(
                            "toggle-theme",
                            if self.theme.is_dark { "Light" } else { "Dark" },
                            colors,
                        )
                        .on_click(cx.listener(|this, _, cx| this.toggle_theme(cx))),
                    ),
            )
    }

    fn render_status_banner(&mut self, cx: &mut ViewContext<Self>) -> Option<AnyElement> {
        let banner: StatusBanner = self.status_log.render()?;
        let colors = &self.theme.colors;
        let has_history = self.status_log.entries().len() > 1;

        let history = banner.history.iter().map(|row| {
            let opacity = match row.transition {
                Transition::Present => 1.0,
                Transition::Entering => row.progress(),
                Transition::Exiting => 1.0 - row.progress(),
            };
            div()
                .id(SharedString::from(format!("status-{}", row.id)))
                .pl(px(16.0))
                .text_xs()
                .opacity(opacity)
                .text_color(rgb(colors.text_secondary))
                .child(row.message.clone())
        });

        Some(
            div()
                .id("status-banner")
                .flex()
                .flex_col()
                .gap(px(4.0))
                .mx(px(16.0))
                .mt(px(8.0))
                .px(px(12.0))
                .py(px(8.0))
                .rounded(px(layout::BORDER_RADIUS))
                .bg(rgb(colors.status_bg))
                .child(
                    div()
                        .flex()
                        .flex_row()
                        .items_center()
                        .gap(px(8.0))
                        .when(banner.live, |el| {
                            el.child(
                                div()
                                    .w(px(8.0))
                                    .h(px(8.0))
                                    .rounded_full()
                                    .bg(rgb(colors.live_dot)),
                            )
                        })
                        .child(
                            div()
                                .flex_1()
                                .text_sm()
                                .text_color(rgb(colors.text_primary))
                                .child(banner.current.clone()),
                        )
                        .when(has_history, |el| {
                            el.child(
                                header_button(
                                    "status-history",
                                    if banner.expanded { "Hide history" } else { "Show history" },
                                    colors,
                                )
                                .on_click(cx.listener(|this, _, cx| this.toggle_status_history(cx))),
                            )
                        })
                        .child(
                            header_button("status-dismiss", "×", colors)
                                .on_click(cx.listener(|this, _, cx| this.dismiss_status(cx))),
                        ),
                )
                .children(history)
                .into_any_element(),
        )
    }

    // ========================================================================
    // Message List
    // ========================================================================

    fn render_messages(&mut self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        let render_cx = RenderContext::new(layout::BUBBLE_MAX_WIDTH, self.viewport.0, self.viewport.1)
            .with_image_max_width(self.config.image_max_width);
        let views = self
            .message_list
            .render(&self.messages, &render_cx, &self.diagrams);

        let now = Instant::now();
        for view in views.iter().filter(|v| v.reveal) {
            self.revealing.insert(view.index, now);
        }

        let bubbles: Vec<AnyElement> = views
            .iter()
            .map(|view| self.render_message(view, cx))
            .collect();
        let empty = bubbles.is_empty();
        let colors = self.theme.colors.clone();

        div()
            .id("message-area")
            .flex_1()
            .min_h_0()
            .w_full()
            .overflow_y_scroll()
            .track_scroll(&self.message_scroll_handle)
            .flex()
            .flex_col()
            .when(empty, |el| {
                el.items_center().justify_center().child(
                    div()
                        .text_sm()
                        .text_color(rgb(colors.text_secondary))
                        .child("No messages yet"),
                )
            })
            .when(!empty, |el| {
                el.px(px(16.0)).py(px(16.0)).gap(px(12.0)).children(bubbles)
            })
    }

    fn render_message(&mut self, view: &MessageView, cx: &mut ViewContext<Self>) -> AnyElement {
        let colors = self.theme.colors.clone();
        let opacity = self
            .revealing
            .get(&view.index)
            .map(|started| (started.elapsed().as_millis() as f32 / REVEAL_MS as f32).min(1.0))
            .unwrap_or(1.0);
        let is_user = view.role == Role::User;

        let attachments: Vec<AnyElement> = view
            .attachments
            .iter()
            .enumerate()
            .map(|(slot, display)| self.render_attachment((view.index, slot), display, &colors, cx))
            .collect();

        div()
            .id(SharedString::from(view.key.to_string()))
            .flex()
            .flex_row()
            .w_full()
            .when(is_user, |el| el.justify_end())
            .child(
                div()
                    .flex()
                    .flex_col()
                    .gap(px(8.0))
                    .max_w(px(layout::BUBBLE_MAX_WIDTH))
                    .px(px(12.0))
                    .py(px(8.0))
                    .rounded(px(layout::BORDER_RADIUS))
                    .opacity(opacity)
                    .bg(rgb(if is_user { colors.user_bubble } else { colors.bot_bubble }))
                    .text_color(rgb(if view.is_status {
                        colors.text_secondary
                    } else {
                        colors.text_primary
                    }))
                    .when(view.is_status, |el| el.text_sm())
                    .when(!view.text.is_empty(), |el| el.child(view.text.clone()))
                    .children(attachments),
            )
            .into_any_element()
    }

    fn render_attachment(
        &mut self,
        at: AttachmentRef,
        display: &FileDisplay,
        colors: &ThemeColors,
        cx: &mut ViewContext<Self>,
    ) -> AnyElement {
        let running = match display {
            FileDisplay::Inline {
                rendered: Rendered::Sandbox { document, .. },
                ..
            } => {
                self.inline_runs.sync(at, document);
                self.inline_runs.is_running(at)
            }
            _ => false,
        };
        let row = self.render_file_row(at, display.row(), running, colors, cx);
        match display {
            FileDisplay::Image { rendered, .. } => div()
                .flex()
                .flex_col()
                .gap(px(4.0))
                .child(self.render_content(rendered, false, colors))
                .child(row)
                .into_any_element(),
            FileDisplay::Inline { rendered, .. } => div()
                .flex()
                .flex_col()
                .gap(px(4.0))
                .child(row)
                .child(self.render_content(rendered, running, colors))
                .into_any_element(),
            FileDisplay::Row(_) => row,
        }
    }

    fn render_file_row(
        &self,
        at: AttachmentRef,
        row: &FileRow,
        running: bool,
        colors: &ThemeColors,
        cx: &mut ViewContext<Self>,
    ) -> AnyElement {
        let selected = self.previewing.get() == Some(at);

        div()
            .flex()
            .flex_row()
            .items_center()
            .gap(px(8.0))
            .px(px(8.0))
            .py(px(4.0))
            .rounded(px(layout::BORDER_RADIUS_SM))
            .border_1()
            .border_color(rgb(if selected { colors.primary } else { colors.border }))
            .child(
                div()
                    .flex_1()
                    .text_sm()
                    .text_color(rgb(colors.text_primary))
                    .child(row.file_name.clone()),
            )
            .when(row.can_run, |el| {
                el.child(
                    header_button(
                        format!("run-{}-{}", at.0, at.1),
                        if running { "Stop" } else { "Run" },
                        colors,
                    )
                    .on_click(cx.listener(move |this, _, cx| this.toggle_inline_run(at, cx))),
                )
            })
            .when(row.can_preview, |el| {
                el.child(
                    header_button(format!("preview-{}-{}", at.0, at.1), "Preview", colors)
                        .on_click(cx.listener(move |this, _, cx| this.preview_attachment(at, cx))),
                )
            })
            .when(row.can_download, |el| {
                el.child(
                    header_button(format!("download-{}-{}", at.0, at.1), "Download", colors)
                        .on_click(cx.listener(move |this, _, cx| this.download_attachment(at, cx))),
                )
            })
            .into_any_element()
    }

    /// Draw a dispatch result. `running` reflects the owning run toggle.
    fn render_content(&mut self, rendered: &Rendered, running: bool, colors: &ThemeColors) -> AnyElement {
        match rendered {
            Rendered::Image(surface) => match self.images.path_for(surface) {
                Some(path) => img(path)
                    .max_w(px(surface.max_width))
                    .rounded(px(layout::BORDER_RADIUS_SM))
                    .into_any_element(),
                None => notice(format!("Unable to display {}", surface.file_name), colors.error),
            },
            Rendered::Sandbox { source, .. } if running => div()
                .flex()
                .flex_col()
                .gap(px(4.0))
                .child(notice(
                    "Running in a sandboxed browser tab; Stop closes it".to_string(),
                    colors.text_secondary,
                ))
                .child(preformatted(source, colors, 0.6))
                .into_any_element(),
            Rendered::Sandbox { source, .. } => preformatted(source, colors, 1.0),
            Rendered::Table(table) => render_table(table, colors),
            Rendered::Empty { message } => notice(message.to_string(), colors.text_secondary),
            Rendered::Text(text) => preformatted(text, colors, 1.0),
            Rendered::DownloadOnly { file_name } => {
                notice(format!("No preview available for {}", file_name), colors.text_secondary)
            }
            Rendered::Unreadable { file_name, reason } => {
                notice(format!("Could not read {}: {}", file_name, reason), colors.error)
            }
        }
    }

    // ========================================================================
    // Preview Panel
    // ========================================================================

    fn render_preview_panel(&mut self, cx: &mut ViewContext<Self>) -> Option<AnyElement> {
        let preview = self.panel.preview()?.clone();
        let title = self.panel.title().unwrap_or_default();
        let state = self.panel.state();
        let running = self.panel.runner().is_running();
        let colors = self.theme.colors.clone();
        let content = self.render_content(&preview.rendered, state.is_rendering_preview, &colors);
        let file = preview.file.clone();

        Some(
            div()
                .id("preview-panel")
                .flex()
                .flex_row()
                .h_full()
                .w(px(state.width_px))
                .flex_shrink_0()
                .bg(rgb(colors.surface))
                // Drag handle on the left edge
                .child(
                    div()
                        .id("preview-panel-resizer")
                        .w(px(layout::RESIZE_HANDLE_WIDTH))
                        .h_full()
                        .cursor(CursorStyle::ResizeLeftRight)
                        .when(state.is_resizing, |el| el.bg(rgba(colors.primary.with_alpha(0.35))))
                        .when(!state.is_resizing, |el| {
                            el.bg(rgb(colors.border))
                                .hover(|s| s.bg(rgba(colors.primary.with_alpha(0.35))))
                        })
                        .on_mouse_down(
                            MouseButton::Left,
                            cx.listener(|this, _event: &MouseDownEvent, cx| {
                                this.panel.pointer_down_on_handle();
                                cx.notify();
                            }),
                        ),
                )
                .child(
                    div()
                        .flex_1()
                        .min_w_0()
                        .flex()
                        .flex_col()
                        .child(
                            div()
                                .h(px(layout::PANEL_HEADER_HEIGHT))
                                .flex()
                                .flex_row()
                                .items_center()
                                .gap(px(8.0))
                                .px(px(12.0))
                                .border_b_1()
                                .border_color(rgb(colors.border))
                                .child(
                                    div()
                                        .flex_1()
                                        .text_sm()
                                        .font_weight(FontWeight::MEDIUM)
                                        .text_color(rgb(colors.text_primary))
                                        .child(title),
                                )
                                .when(preview.category.is_sandboxed(), |el| {
                                    el.child(
                                        header_button("preview-run", if running { "Stop" } else { "Run" }, &colors)
                                            .on_click(cx.listener(|this, _, cx| this.toggle_preview_run(cx))),
                                    )
                                })
                                .child(
                                    header_button("preview-download", "Download", &colors).on_click(
                                        cx.listener(move |this, _, cx| this.download_file(file.clone(), cx)),
                                    ),
                                )
                                .child(
                                    header_button("preview-close", "×", &colors)
                                        .on_click(cx.listener(|this, _, cx| this.close_preview(cx))),
                                ),
                        )
                        .child(
                            div()
                                .id("preview-content")
                                .flex_1()
                                .min_h_0()
                                .overflow_y_scroll()
                                .p(px(12.0))
                                .child(content),
                        ),
                )
                .into_any_element(),
        )
    }
}

impl Render for ChatWindow {
    fn render(&mut self, cx: &mut ViewContext<Self>) -> impl IntoElement {
        self.sync_viewport(cx);

        if let Some(screen) = self.auth_screen.clone() {
            return div()
                .id("chatview-window")
                .size_full()
                .child(self.render_auth_screen(&screen, cx));
        }

        let colors = self.theme.colors.clone();
        let resizing = self.panel.drag_host().is_listening();
        let header = self.render_header(cx).into_any_element();
        let status = self.render_status_banner(cx);
        let messages = self.render_messages(cx).into_any_element();
        let panel = self.render_preview_panel(cx);

        div()
            .id("chatview-window")
            .key_context("ChatWindow")
            .track_focus(&self.focus_handle)
            .size_full()
            .flex()
            .flex_row()
            .bg(rgb(colors.background))
            .text_color(rgb(colors.text_primary))
            .when(resizing, |el| el.cursor(CursorStyle::ResizeLeftRight))
            .on_mouse_move(cx.listener(|this, event: &MouseMoveEvent, cx| {
                this.on_pointer_move(event, cx);
            }))
            .on_mouse_up(MouseButton::Left, cx.listener(|this, _event: &MouseUpEvent, cx| {
                this.on_pointer_up(cx);
            }))
            .on_mouse_up_out(MouseButton::Left, cx.listener(|this, _event: &MouseUpEvent, cx| {
                this.on_pointer_up(cx);
            }))
            .on_key_down(cx.listener(|this, event: &KeyDownEvent, cx| {
                if event.keystroke.key == "escape" && this.panel.is_open() {
                    this.close_preview(cx);
                }
            }))
            .child(
                div()
                    .flex_1()
                    .min_w_0()
                    .h_full()
                    .flex()
                    .flex_col()
                    .child(header)
                    .children(status)
                    .child(messages),
            )
            .children(panel)
    }
}

// ============================================================================
// Element Helpers
// ============================================================================

fn header_button(id: impl Into<SharedString>, label: &str, colors: &ThemeColors) -> Stateful<Div> {
    div()
        .id(id.into())
        .px(px(8.0))
        .py(px(2.0))
        .rounded(px(layout::BORDER_RADIUS_SM))
        .text_xs()
        .text_color(rgb(colors.text_secondary))
        .cursor_pointer()
        .hover(|s| s.bg(rgba(colors.hover)).text_color(rgb(colors.text_primary)))
        .child(label.to_string())
}

fn notice(text: String, color: chatview_ui::Rgba) -> AnyElement {
    div().text_sm().text_color(rgb(color)).child(text).into_any_element()
}

fn preformatted(text: &str, colors: &ThemeColors, opacity: f32) -> AnyElement {
    div()
        .p(px(8.0))
        .rounded(px(layout::BORDER_RADIUS_SM))
        .bg(rgb(colors.code_bg))
        .text_xs()
        .opacity(opacity)
        .text_color(rgb(colors.text_primary))
        .children(text.lines().map(|line| div().min_h(px(14.0)).child(line.to_string())))
        .into_any_element()
}

fn render_table(table: &CsvTable, colors: &ThemeColors) -> AnyElement {
    let columns = table.column_count();
    let row = |cells: &[String], header: bool| {
        div()
            .flex()
            .flex_row()
            .border_b_1()
            .border_color(rgb(colors.border))
            .when(header, |el| el.bg(rgb(colors.code_bg)).font_weight(FontWeight::BOLD))
            .children((0..columns).map(|i| {
                div()
                    .flex_1()
                    .min_w(px(60.0))
                    .px(px(8.0))
                    .py(px(4.0))
                    .text_xs()
                    .child(cells.get(i).cloned().unwrap_or_default())
            }))
    };

    div()
        .flex()
        .flex_col()
        .rounded(px(layout::BORDER_RADIUS_SM))
        .border_1()
        .border_color(rgb(colors.border))
        .text_color(rgb(colors.text_primary))
        .child(row(table.header.as_slice(), true))
        .children(table.rows.iter().map(|cells| row(cells.as_slice(), false)))
        .into_any_element()
}

// ============================================================================
// Color Helpers
// ============================================================================

fn rgb(c: chatview_ui::Rgba) -> Rgba {
    Rgba {
        r: c.r,
        g: c.g,
        b: c.b,
        a: 1.0,
    }
}

fn rgba(c: chatview_ui::Rgba) -> Rgba {
    Rgba {
        r: c.r,
        g: c.g,
        b: c.b,
        a: c.a,
    }
}

//! Chatview UI Library
//!
//! GPUI-based desktop UI for Chatview.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┬──────────────────────┐
//! │ ChatWindow                                   ┃ PreviewPanel         │
//! │                                              ┃ (300px .. 70% vw)    │
//! │ ┌──────────────────────────────────────────┐ ┃ ┌──────────────────┐ │
//! │ │StatusBanner (current + history)          │ ┃ │Preview: {name} [x]│ │
//! │ └──────────────────────────────────────────┘ ┃ └──────────────────┘ │
//! │ ┌──────────────────────────────────────────┐ ┃ ┌──────────────────┐ │
//! │ │MessageList                               │ ┃ │Rendered content  │ │
//! │ │  bubble + attachments [Download][Preview]│ ┃ │ (run toggle for  │ │
//! │ └──────────────────────────────────────────┘ ┃ │  html / mermaid) │ │
//! │ [Attach file]                                ┃ └──────────────────┘ │
//! └──────────────────────────────────────────────┸──────────────────────┘
//!                                    drag handle ┘
//! ```

pub mod adapters;
pub mod state;
pub mod theme;

// Re-exports
pub use adapters::{FrameRegistry, PreviewServer, ServedFrameHost, WindowDragHost};
pub use state::{load_transcript, ImageCache, Transcript};
pub use theme::{layout, Rgba, Spacing, Theme, ThemeColors, Typography};

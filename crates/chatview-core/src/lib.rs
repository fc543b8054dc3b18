//! Chatview Core Library
//!
//! This crate provides the browser-free core of the Chatview chat client:
//! - Attachment classification, preview dispatch and sandboxed previews
//! - The resizable preview panel state machine
//! - Message reveal tracking and the status log banner
//! - The OAuth temp-code exchange and durable key-value storage
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     chatview-core                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  preview/      - classify, render, run toggle, downloads    │
//! │  panel.rs      - resizable side panel state machine         │
//! │  messages.rs   - message list and reveal tracking           │
//! │  status.rs     - status log banner                          │
//! │  auth.rs       - temp-code to token exchange                │
//! │  store/        - key-value store (memory, SQLite)           │
//! │  config.rs     - application configuration                  │
//! │  types/        - Shared type definitions                    │
//! │  error.rs      - Error types                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way: attachment → classifier → dispatch → view model.
//! The panel shell wraps the dispatch output.

pub mod auth;
pub mod config;
pub mod error;
pub mod messages;
pub mod panel;
pub mod preview;
pub mod status;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;

pub use auth::{AuthCallback, AuthScreen, HttpTokenExchange, TokenExchange, TokenPair};
pub use config::{AppConfig, ThemeSetting};
pub use messages::{MessageList, MessageView, RevealTracker};
pub use panel::{DragHost, PanelPhase, PanelState, PreviewPanel};
pub use preview::{
    classify, download, render, BlobRegistry, CdnMermaidRenderer, DiagramRenderer, FileDisplay,
    FrameHost, FrameId, InlineRunners, ObjectUrl, PreviewRunner, Rendered, SandboxDocument, SaveSink,
};
pub use status::{StatusBanner, StatusLog};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, Subscription};

//! Core type definitions for Chatview
//!
//! Shared data model: attachments and their categories, chat messages and
//! status entries.

mod attachment_types;
mod message_types;
mod status_types;

pub use attachment_types::*;
pub use message_types::*;
pub use status_types::*;

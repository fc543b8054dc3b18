//! Application state for the Chatview UI

mod image_cache;
mod transcript;

pub use image_cache::ImageCache;
pub use transcript::{load_transcript, Transcript};

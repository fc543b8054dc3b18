//! Window views

mod chat_window;

pub use chat_window::ChatWindow;

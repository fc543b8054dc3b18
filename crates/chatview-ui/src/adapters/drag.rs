//! Window-level drag plumbing for the preview panel

use chatview_core::DragHost;
use std::collections::BTreeSet;
use tracing::trace;

/// GPUI delivers mouse events to the root element, which forwards them to the
/// panel only while this host is listening.
#[derive(Debug, Default)]
pub struct WindowDragHost {
    listening: bool,
    classes: BTreeSet<String>,
}

impl WindowDragHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether pointer moves and releases should reach the panel
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Whether the window carries `class` (text selection is suppressed while
    /// `resize-active` is set)
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

impl DragHost for WindowDragHost {
    fn attach_window_listeners(&mut self) {
        trace!("window drag listeners attached");
        self.listening = true;
    }

    fn detach_window_listeners(&mut self) {
        trace!("window drag listeners detached");
        self.listening = false;
    }

    fn set_body_class(&mut self, class: &str, enabled: bool) {
        if enabled {
            self.classes.insert(class.to_string());
        } else {
            self.classes.remove(class);
        }
    }
}

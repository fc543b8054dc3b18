//! Desktop implementations of the core's host traits

mod drag;
mod frames;
mod preview_server;

pub use drag::WindowDragHost;
pub use frames::{FrameRegistry, ServedFrameHost, HEARTBEAT_MS, STOPPED_PAGE};
pub use preview_server::{build_router, PreviewServer};

//! Sandbox frames served by the app's local preview server
//!
//! Each mount registers a host page embedding the document in a sandboxed
//! iframe and queues its URL for the system browser. The page keeps polling
//! its frame's liveness; once the frame is unmounted the server answers
//! `410 Gone` and the page removes the iframe, discarding its script state.

use chatview_core::preview::html::escape_html;
use chatview_core::{FrameHost, FrameId, SandboxDocument};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Interval at which a host page checks that its frame is still live
pub const HEARTBEAT_MS: u64 = 250;

/// Live host pages, shared between the frame hosts and the server
#[derive(Debug, Default)]
pub struct FrameRegistry {
    next_id: AtomicU64,
    pages: RwLock<HashMap<FrameId, String>>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self) -> FrameId {
        FrameId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn insert(&self, frame: FrameId, page: String) {
        self.pages.write().insert(frame, page);
    }

    fn remove(&self, frame: FrameId) -> bool {
        self.pages.write().remove(&frame).is_some()
    }

    pub fn page(&self, frame: FrameId) -> Option<String> {
        self.pages.read().get(&frame).cloned()
    }

    pub fn is_live(&self, frame: FrameId) -> bool {
        self.pages.read().contains_key(&frame)
    }

    pub fn live_frames(&self) -> usize {
        self.pages.read().len()
    }
}

/// Frame host whose surfaces are pages on the preview server
pub struct ServedFrameHost {
    registry: Arc<FrameRegistry>,
    base_url: String,
    mounted: HashSet<FrameId>,
    pending_open: Vec<String>,
}

impl ServedFrameHost {
    pub fn new(registry: Arc<FrameRegistry>, base_url: impl Into<String>) -> Self {
        Self {
            registry,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mounted: HashSet::new(),
            pending_open: Vec::new(),
        }
    }

    /// URLs mounted since the last call, to be opened by the window
    pub fn take_pending_opens(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_open)
    }

    pub fn url_for(&self, frame: FrameId) -> String {
        format!("{}/frames/{}", self.base_url, frame.0)
    }

    pub fn registry(&self) -> &Arc<FrameRegistry> {
        &self.registry
    }
}

impl FrameHost for ServedFrameHost {
    fn mount(&mut self, document: &SandboxDocument) -> FrameId {
        let frame = self.registry.allocate();
        self.registry.insert(frame, host_page(frame, document));
        self.mounted.insert(frame);

        let url = self.url_for(frame);
        debug!(?frame, %url, "registered sandbox page");
        self.pending_open.push(url);
        frame
    }

    fn unmount(&mut self, frame: FrameId) {
        if !self.mounted.remove(&frame) {
            return;
        }
        let url = self.url_for(frame);
        self.pending_open.retain(|u| u != &url);
        if self.registry.remove(frame) {
            debug!(?frame, "revoked sandbox page");
        }
    }
}

impl Drop for ServedFrameHost {
    fn drop(&mut self) {
        for frame in self.mounted.drain() {
            self.registry.remove(frame);
        }
    }
}

const HOST_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Preview</title></head>
<body style="margin:0;font-family:system-ui,sans-serif">
<iframe id="preview" sandbox="{{POLICY}}" srcdoc="{{SRCDOC}}" style="width:100%;max-width:{{WIDTH}}px;height:{{HEIGHT}}px;border:0"></iframe>
<p id="stopped" hidden style="padding:16px;color:#6b7280">Preview stopped. Press Run in Chatview to start it again.</p>
<script>
(function () {
  var timer = setInterval(check, {{HEARTBEAT}});
  function check() {
    fetch("/frames/{{ID}}/alive", { cache: "no-store" })
      .then(function (r) { if (!r.ok) stop(); })
      .catch(stop);
  }
  function stop() {
    clearInterval(timer);
    var frame = document.getElementById("preview");
    if (frame) frame.remove();
    document.getElementById("stopped").hidden = false;
  }
})();
</script>
</body>
</html>
"#;

/// Page shown for a frame that has been stopped or never existed
pub const STOPPED_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Preview</title></head>
<body style="font-family:system-ui,sans-serif;color:#6b7280">
<p>Preview stopped. Press Run in Chatview to start it again.</p>
</body>
</html>
"#;

fn host_page(frame: FrameId, document: &SandboxDocument) -> String {
    HOST_PAGE
        .replace("{{POLICY}}", document.policy)
        .replace("{{WIDTH}}", &document.max_width.round().to_string())
        .replace("{{HEIGHT}}", &document.height.round().to_string())
        .replace("{{HEARTBEAT}}", &HEARTBEAT_MS.to_string())
        .replace("{{ID}}", &frame.0.to_string())
        // Last, so nothing inside the user document is treated as a placeholder
        .replace("{{SRCDOC}}", &escape_html(&document.html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatview_core::PreviewRunner;
    use pretty_assertions::assert_eq;

    fn document() -> SandboxDocument {
        SandboxDocument::from_html("<p>hi</p><script>let x = 1;</script>", 400.0, 900.0)
    }

    fn host() -> ServedFrameHost {
        ServedFrameHost::new(Arc::new(FrameRegistry::new()), "http://127.0.0.1:4000/")
    }

    #[test]
    fn test_mount_registers_sandboxed_page() {
        let mut host = host();
        let frame = host.mount(&document());

        let page = host.registry().page(frame).unwrap();
        assert!(page.contains("sandbox=\"allow-scripts\""));
        assert!(page.contains("&lt;p&gt;hi&lt;/p&gt;"));
        assert!(page.contains("height:700px"));
        assert!(page.contains(&format!("/frames/{}/alive", frame.0)));
        assert_eq!(
            host.take_pending_opens(),
            vec![format!("http://127.0.0.1:4000/frames/{}", frame.0)]
        );
        assert!(host.take_pending_opens().is_empty());
    }

    #[test]
    fn test_unmount_revokes_page_immediately() {
        let mut host = host();
        let frame = host.mount(&document());
        host.unmount(frame);

        assert!(!host.registry().is_live(frame));
        assert!(host.registry().page(frame).is_none());
        assert!(host.take_pending_opens().is_empty());
    }

    #[test]
    fn test_hosts_share_ids_but_not_frames() {
        let registry = Arc::new(FrameRegistry::new());
        let mut a = ServedFrameHost::new(registry.clone(), "http://x");
        let mut b = ServedFrameHost::new(registry.clone(), "http://x");

        let fa = a.mount(&document());
        let fb = b.mount(&document());
        assert_ne!(fa, fb);

        // A host never tears down another host's frame
        a.unmount(fb);
        assert!(registry.is_live(fb));

        drop(b);
        assert!(!registry.is_live(fb));
        assert!(registry.is_live(fa));
    }

    #[test]
    fn test_each_run_gets_a_new_page() {
        let registry = Arc::new(FrameRegistry::new());
        let mut runner = PreviewRunner::new(ServedFrameHost::new(registry.clone(), "http://x"), false);
        runner.load(document());

        runner.start();
        let first = runner.frame().unwrap();
        runner.stop();
        runner.start();
        let second = runner.frame().unwrap();

        assert_ne!(first, second);
        assert!(!registry.is_live(first));
        assert!(registry.is_live(second));
        assert_eq!(registry.live_frames(), 1);

        drop(runner);
        assert_eq!(registry.live_frames(), 0);
    }
}

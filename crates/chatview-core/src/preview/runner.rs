//! Run/stop toggle for sandboxed previews
//!
//! Every "run" mounts a brand-new frame and every "stop" unmounts it, so no
//! script state survives a toggle cycle.

use super::html::SandboxDocument;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Identifier of one mounted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Owner of the isolated render surfaces
pub trait FrameHost {
    /// Create a fresh frame and load `document` into it
    fn mount(&mut self, document: &SandboxDocument) -> FrameId;
    /// Destroy a frame; its script state is discarded
    fn unmount(&mut self, frame: FrameId);
}

/// Sandboxed preview with a run toggle
pub struct PreviewRunner<H: FrameHost> {
    host: H,
    document: Option<SandboxDocument>,
    auto_run: bool,
    running: bool,
    frame: Option<FrameId>,
}

impl<H: FrameHost> PreviewRunner<H> {
    /// `auto_run` makes freshly loaded documents start running
    pub fn new(host: H, auto_run: bool) -> Self {
        Self {
            host,
            document: None,
            auto_run,
            running: auto_run,
            frame: None,
        }
    }

    /// Replace the previewed document. A running preview is remounted.
    pub fn load(&mut self, document: SandboxDocument) {
        self.unmount();
        self.document = Some(document);
        if self.running {
            self.mount();
        }
    }

    /// Drop the document, tear down any frame and return the run toggle to
    /// its initial state
    pub fn clear(&mut self) {
        self.unmount();
        self.document = None;
        self.running = self.auto_run;
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.mount();
    }

    /// Synchronously tears down the render surface
    pub fn stop(&mut self) {
        self.running = false;
        self.unmount();
    }

    /// Flip the run state, returning the new state
    pub fn toggle(&mut self) -> bool {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
        self.running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    pub fn document(&self) -> Option<&SandboxDocument> {
        self.document.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn mount(&mut self) {
        if self.frame.is_some() {
            return;
        }
        if let Some(document) = &self.document {
            let frame = self.host.mount(document);
            debug!(?frame, kind = ?document.kind, "mounted sandbox frame");
            self.frame = Some(frame);
        }
    }

    fn unmount(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.host.unmount(frame);
            debug!(?frame, "unmounted sandbox frame");
        }
    }
}

impl<H: FrameHost> Drop for PreviewRunner<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

type HostFactory<H> = Box<dyn Fn() -> H>;

/// Run toggles for sandboxed attachments shown inline, one runner per key
pub struct InlineRunners<K, H: FrameHost> {
    make_host: HostFactory<H>,
    auto_run: bool,
    runners: HashMap<K, PreviewRunner<H>>,
}

impl<K: Eq + Hash + Copy, H: FrameHost> InlineRunners<K, H> {
    pub fn new(auto_run: bool, make_host: impl Fn() -> H + 'static) -> Self {
        Self {
            make_host: Box::new(make_host),
            auto_run,
            runners: HashMap::new(),
        }
    }

    /// Register the document shown for `key`. Only the first sighting loads
    /// it, so repeated renders never remount a running frame.
    pub fn sync(&mut self, key: K, document: &SandboxDocument) {
        if self.runners.contains_key(&key) {
            return;
        }
        let mut runner = PreviewRunner::new((self.make_host)(), self.auto_run);
        runner.load(document.clone());
        self.runners.insert(key, runner);
    }

    /// Flip the toggle for `key`; unknown keys stay stopped
    pub fn toggle(&mut self, key: K) -> bool {
        self.runners
            .get_mut(&key)
            .map(PreviewRunner::toggle)
            .unwrap_or(false)
    }

    pub fn is_running(&self, key: K) -> bool {
        self.runners
            .get(&key)
            .map(|runner| runner.frame().is_some())
            .unwrap_or(false)
    }

    /// Tear down every runner whose key fails `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.runners.retain(|key, _| keep(key));
    }

    pub fn clear(&mut self) {
        self.runners.clear();
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    pub fn hosts_mut(&mut self) -> impl Iterator<Item = &mut H> {
        self.runners.values_mut().map(PreviewRunner::host_mut)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::BTreeMap;

    /// Simulates frames whose document script increments a frame-global
    /// counter each time the document loads.
    #[derive(Debug, Default)]
    pub struct CountingHost {
        next_id: u64,
        pub live: BTreeMap<FrameId, u32>,
        pub load_count: u32,
        pub unmounted: Vec<FrameId>,
    }

    impl FrameHost for CountingHost {
        fn mount(&mut self, _document: &SandboxDocument) -> FrameId {
            self.next_id += 1;
            let frame = FrameId(self.next_id);
            // Fresh frame, fresh globals: the counter starts at zero
            let counter = self.live.entry(frame).or_insert(0);
            *counter += 1;
            self.load_count += 1;
            frame
        }

        fn unmount(&mut self, frame: FrameId) {
            self.live.remove(&frame);
            self.unmounted.push(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CountingHost;
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc() -> SandboxDocument {
        SandboxDocument::from_html("<script>window.count = (window.count || 0) + 1;</script>", 400.0, 800.0)
    }

    #[test]
    fn test_default_is_not_running() {
        let mut runner = PreviewRunner::new(CountingHost::default(), false);
        runner.load(doc());
        assert!(!runner.is_running());
        assert!(runner.frame().is_none());
        assert_eq!(runner.host().load_count, 0);
    }

    #[test]
    fn test_auto_run_mounts_on_load() {
        let mut runner = PreviewRunner::new(CountingHost::default(), true);
        runner.load(doc());
        assert!(runner.frame().is_some());
        assert_eq!(runner.host().load_count, 1);
    }

    #[test]
    fn test_toggle_cycle_remounts_fresh_frame() {
        let mut runner = PreviewRunner::new(CountingHost::default(), false);
        runner.load(doc());

        let mut frames = Vec::new();
        for _ in 0..3 {
            assert!(runner.toggle());
            let frame = runner.frame().unwrap();
            // One increment per "on" transition, never carried over
            assert_eq!(runner.host().live[&frame], 1);
            frames.push(frame);

            assert!(!runner.toggle());
            assert!(runner.frame().is_none());
            assert!(runner.host().live.is_empty());
        }

        assert_eq!(runner.host().load_count, 3);
        assert_eq!(runner.host().unmounted, frames);
        for (i, a) in frames.iter().enumerate() {
            assert!(frames[i + 1..].iter().all(|b| a != b));
        }
    }

    #[test]
    fn test_load_while_running_replaces_frame() {
        let mut runner = PreviewRunner::new(CountingHost::default(), true);
        runner.load(doc());
        let first = runner.frame().unwrap();
        runner.load(doc());
        let second = runner.frame().unwrap();

        assert_ne!(first, second);
        assert_eq!(runner.host().unmounted, vec![first]);
        assert_eq!(runner.host().live.len(), 1);
    }

    #[test]
    fn test_start_without_document_mounts_nothing() {
        let mut runner = PreviewRunner::new(CountingHost::default(), false);
        runner.start();
        assert!(runner.is_running());
        assert!(runner.frame().is_none());
    }

    #[test]
    fn test_clear_unmounts() {
        let mut runner = PreviewRunner::new(CountingHost::default(), true);
        runner.load(doc());
        runner.clear();
        assert!(runner.document().is_none());
        assert!(runner.host().live.is_empty());
        assert!(runner.is_running());
    }

    #[test]
    fn test_clear_resets_manual_run() {
        let mut runner = PreviewRunner::new(CountingHost::default(), false);
        runner.load(doc());
        runner.start();
        runner.clear();
        assert!(!runner.is_running());

        runner.load(doc());
        assert!(runner.frame().is_none());
        assert_eq!(runner.host().load_count, 1);
    }

    /// Lets every inline runner report into one counting host
    struct SharedHost(Rc<RefCell<CountingHost>>);

    impl FrameHost for SharedHost {
        fn mount(&mut self, document: &SandboxDocument) -> FrameId {
            let frame = self.0.borrow_mut().mount(document);
            frame
        }

        fn unmount(&mut self, frame: FrameId) {
            self.0.borrow_mut().unmount(frame);
        }
    }

    fn shared_host() -> (impl Fn() -> SharedHost + 'static, Rc<RefCell<CountingHost>>) {
        let inner = Rc::new(RefCell::new(CountingHost::default()));
        let handle = inner.clone();
        (move || SharedHost(inner.clone()), handle)
    }

    #[test]
    fn test_inline_runners_toggle_independently() {
        let (make_host, frames) = shared_host();
        let mut runners = InlineRunners::new(false, make_host);
        runners.sync((0, 0), &doc());
        runners.sync((1, 0), &doc());
        assert_eq!(frames.borrow().load_count, 0);

        assert!(runners.toggle((1, 0)));
        assert!(runners.is_running((1, 0)));
        assert!(!runners.is_running((0, 0)));
        assert_eq!(frames.borrow().live.len(), 1);

        // Re-syncing on the next render leaves the frame alone
        runners.sync((1, 0), &doc());
        assert_eq!(frames.borrow().load_count, 1);

        assert!(!runners.toggle((1, 0)));
        assert!(frames.borrow().live.is_empty());
        assert!(!runners.toggle((5, 5)));
    }

    #[test]
    fn test_inline_runners_auto_run_and_teardown() {
        let (make_host, frames) = shared_host();
        let mut runners = InlineRunners::new(true, make_host);
        runners.sync((0, 0), &doc());
        runners.sync((0, 1), &doc());
        assert_eq!(frames.borrow().live.len(), 2);

        runners.retain(|key| key.1 == 0);
        assert_eq!(runners.len(), 1);
        assert_eq!(frames.borrow().live.len(), 1);

        runners.clear();
        assert!(runners.is_empty());
        assert!(frames.borrow().live.is_empty());
    }
}

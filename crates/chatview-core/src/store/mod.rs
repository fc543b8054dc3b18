//! Durable client-side key-value storage
//!
//! This module provides:
//! - The [`KeyValueStore`] abstraction with change subscriptions
//! - An in-memory store and a SQLite-backed store
//! - Well-known keys and theme resolution

mod memory;
mod migrations;
mod sqlite;

pub use memory::MemoryStore;
pub use migrations::run_migrations;
pub use sqlite::SqliteStore;

use crate::error::Result;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Well-known keys
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const THEME: &str = "theme";
}

/// A change to one key; `value` is `None` after removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub key: String,
    pub value: Option<String>,
}

pub type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// Listen for changes until the returned subscription is dropped
    fn subscribe(&self, listener: Listener) -> Subscription;
}

#[derive(Default)]
struct ListenerSet {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Listener registry shared by the store implementations
#[derive(Clone, Default)]
pub(crate) struct Subscribers {
    inner: Arc<Mutex<ListenerSet>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&self, listener: Listener) -> Subscription {
        let mut set = self.inner.lock();
        set.next_id += 1;
        let id = set.next_id;
        set.listeners.push((id, listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn notify(&self, key: &str, value: Option<&str>) {
        // Listeners run outside the lock so they may touch the store
        let listeners: Vec<Listener> = self
            .inner
            .lock()
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        let event = StoreEvent {
            key: key.to_string(),
            value: value.map(str::to_string),
        };
        for listener in listeners {
            listener(&event);
        }
    }
}

/// Active change subscription; dropping it unsubscribes
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerSet>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Dark mode is on when the document already carries the `dark` class, the
/// stored theme is `dark`, or no theme is stored and the system prefers dark.
pub fn is_dark_mode(
    store: &dyn KeyValueStore,
    document_has_dark_class: bool,
    system_prefers_dark: bool,
) -> Result<bool> {
    if document_has_dark_class {
        return Ok(true);
    }
    Ok(match store.get(keys::THEME)?.as_deref() {
        Some("dark") => true,
        Some(_) => false,
        None => system_prefers_dark,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dark_mode_resolution() {
        let store = MemoryStore::new();
        assert!(!is_dark_mode(&store, false, false).unwrap());
        assert!(is_dark_mode(&store, false, true).unwrap());
        assert!(is_dark_mode(&store, true, false).unwrap());

        store.set(keys::THEME, "light").unwrap();
        assert!(!is_dark_mode(&store, false, true).unwrap());

        store.set(keys::THEME, "dark").unwrap();
        assert!(is_dark_mode(&store, false, false).unwrap());
    }

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let subscribers = Subscribers::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let sub = subscribers.subscribe(Arc::new(move |_: &StoreEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        subscribers.notify("k", Some("v"));
        drop(sub);
        subscribers.notify("k", None);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

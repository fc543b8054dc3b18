//! In-memory key-value store

use super::{KeyValueStore, Listener, Subscribers, Subscription};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-lifetime store, used in tests and for ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    subscribers: Subscribers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        self.subscribers.notify(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.values.write().remove(key).is_some() {
            self.subscribers.notify(key, None);
        }
        Ok(())
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        self.subscribers.subscribe(listener)
    }
}

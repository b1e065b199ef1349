//! Collaborator settings store
//!
//! Small key-value store with change notification, standing in for the
//! persisted-store layer (color scheme, locale). The navigation session
//! subscribes to it so that any change to presentation-affecting state
//! flushes the document cache.

use std::collections::HashMap;
use std::sync::RwLock;

type Watcher = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Key-value store notifying subscribers on every write
pub struct SettingsStore {
    values: RwLock<HashMap<String, String>>,
    watchers: RwLock<Vec<Watcher>>,
}

impl SettingsStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            watchers: RwLock::new(Vec::new()),
        }
    }

    /// Get the value for a key
    pub fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().ok()?;
        values.get(key).cloned()
    }

    /// Set a value and notify every subscriber
    pub fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
        if let Ok(watchers) = self.watchers.read() {
            for watcher in watchers.iter() {
                watcher(key, value);
            }
        }
    }

    /// Register a change watcher, called with (key, new value) on every set
    pub fn subscribe(&self, watcher: impl Fn(&str, &str) + Send + Sync + 'static) {
        if let Ok(mut watchers) = self.watchers.write() {
            watchers.push(Box::new(watcher));
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_set_get() {
        let store = SettingsStore::new();
        assert_eq!(store.get("color-scheme"), None);

        store.set("color-scheme", "dark");
        assert_eq!(store.get("color-scheme"), Some("dark".to_string()));
    }

    #[test]
    fn test_watchers_fire_on_every_set() {
        let store = SettingsStore::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        store.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.set("color-scheme", "dark");
        store.set("locale", "de");
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_watcher_sees_key_and_value() {
        let store = SettingsStore::new();
        let seen = Arc::new(RwLock::new(Vec::new()));

        let sink = Arc::clone(&seen);
        store.subscribe(move |key, value| {
            sink.write().unwrap().push(format!("{key}={value}"));
        });

        store.set("locale", "fr");
        assert_eq!(seen.read().unwrap().as_slice(), ["locale=fr"]);
    }
}

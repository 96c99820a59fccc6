//! Hierarchical key/value context with parent delegation.
//!
//! A context chain is a tree: each node owns its local storage and shares
//! its parent. Lookups fall through to the parent when the key is absent
//! locally; destroying a node only severs its own parent link.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::value::Value;

/// Local-storage hooks for a context node.
///
/// Chain resolution never touches storage directly; it only asks these
/// questions, so lookup order is identical for every backend.
pub trait ContextStorage: Send + Sync {
    /// Does the key exist locally? A key holding a stored null still
    /// exists.
    fn has_key(&self, key: &str) -> bool;

    /// Local value for the key; `None` for both a stored null and a
    /// missing key. Presence is [`ContextStorage::has_key`]'s job.
    fn do_get(&self, key: &str) -> Option<Value>;

    /// Store a value locally. `None` stores an explicit null.
    fn put(&self, key: &str, value: Option<Value>);

    /// Remove a local key, returning its value when one was stored.
    fn remove(&self, key: &str) -> Option<Value>;
}

/// Default in-memory storage backend.
#[derive(Default)]
pub struct MapStorage {
    entries: RwLock<HashMap<String, Option<Value>>>,
}

impl MapStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContextStorage for MapStorage {
    fn has_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    fn do_get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned().flatten())
    }

    fn put(&self, key: &str, value: Option<Value>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_owned(), value);
        }
    }

    fn remove(&self, key: &str) -> Option<Value> {
        self.entries
            .write()
            .ok()
            .and_then(|mut entries| entries.remove(key).flatten())
    }
}

/// A node in a context chain.
///
/// Parents are shared (`Arc`), never owned: destroying a child must not
/// destroy the parent, and many children may chain to one parent.
pub struct ContextChain {
    storage: Box<dyn ContextStorage>,
    parent: RwLock<Option<Arc<ContextChain>>>,
}

impl ContextChain {
    /// Root node backed by [`MapStorage`].
    pub fn new() -> Self {
        Self::with_storage(Box::new(MapStorage::new()), None)
    }

    /// Child node backed by [`MapStorage`].
    pub fn with_parent(parent: Arc<ContextChain>) -> Self {
        Self::with_storage(Box::new(MapStorage::new()), Some(parent))
    }

    /// Node with a custom storage backend.
    pub fn with_storage(
        storage: Box<dyn ContextStorage>,
        parent: Option<Arc<ContextChain>>,
    ) -> Self {
        Self {
            storage,
            parent: RwLock::new(parent),
        }
    }

    pub fn parent(&self) -> Option<Arc<ContextChain>> {
        self.parent.read().ok().and_then(|parent| parent.clone())
    }

    /// Resolve a key: the local value when the key exists locally, else
    /// the parent chain, else `None`. Missing keys are never an error.
    pub fn get(&self, key: &str) -> Option<Value> {
        if self.storage.has_key(key) {
            self.storage.do_get(key)
        } else if let Some(parent) = self.parent() {
            parent.get(key)
        } else {
            None
        }
    }

    /// Resolve a key, falling back to `default` when the chain yields
    /// nothing (absent everywhere, or resolved to a stored null).
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Key presence, with the same parent delegation as [`Self::get`].
    pub fn contains_key(&self, key: &str) -> bool {
        if self.storage.has_key(key) {
            true
        } else if let Some(parent) = self.parent() {
            parent.contains_key(key)
        } else {
            false
        }
    }

    pub fn put(&self, key: &str, value: Value) {
        self.storage.put(key, Some(value));
    }

    /// Mark a key present with an explicit null.
    pub fn put_null(&self, key: &str) {
        self.storage.put(key, None);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.storage.remove(key)
    }

    /// Sever the parent link. Idempotent; never propagates destruction
    /// up or down the chain.
    pub fn destroy(&self) {
        if let Ok(mut parent) = self.parent.write() {
            *parent = None;
        }
    }
}

impl Default for ContextChain {
    fn default() -> Self {
        Self::new()
    }
}

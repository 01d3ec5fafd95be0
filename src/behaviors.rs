//! Named behavior subscriptions.
//!
//! A behavior is an application-level event name. Any number of listeners
//! may register under one name; triggering the name calls each of them in
//! registration order.
//!
//! Registration and removal take the bus's [`AsyncFifoLock`] around the
//! identifier counter and both indexes, so concurrent registrations are
//! serviced in arrival order and never share an identifier. Identifiers
//! are handed out monotonically and never reused.

use crate::catalog::Catalog;
use crate::config::DEFAULT_BUS_CAPACITY;
use crate::lock::AsyncFifoLock;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifier of one registered listener.
pub type BehaviorId = u64;

/// Callback invoked when its behavior is triggered.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: BehaviorId,
    /// Behavior name to listener ids, in registration order.
    by_name: HashMap<String, Vec<BehaviorId>>,
    by_id: HashMap<BehaviorId, (String, Listener)>,
}

/// Publish/subscribe table keyed by behavior name.
pub struct BehaviorBus {
    lock: AsyncFifoLock,
    registry: Mutex<Registry>,
    capacity: u64,
    catalog: Option<Arc<Catalog>>,
}

impl BehaviorBus {
    /// Create a bus with the default identifier capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Create a bus that hands out at most `capacity` identifiers.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            lock: AsyncFifoLock::new(),
            registry: Mutex::new(Registry::default()),
            capacity,
            catalog: None,
        }
    }

    /// Attach the declared behavior names; triggering an undeclared name
    /// is then logged.
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Register `callback` under `name`.
    ///
    /// Returns `None` if the name is empty or the identifier space is
    /// exhausted.
    pub async fn register<F>(&self, name: &str, callback: F) -> Option<BehaviorId>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        if name.is_empty() {
            warn!("refusing to register a behavior with an empty name");
            return None;
        }

        let _guard = self.lock.lock().await;
        let mut registry = self.registry.lock();
        if registry.next_id >= self.capacity {
            warn!(
                behavior = name,
                capacity = self.capacity,
                "behavior identifier space exhausted"
            );
            return None;
        }

        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .by_name
            .entry(name.to_string())
            .or_default()
            .push(id);
        registry
            .by_id
            .insert(id, (name.to_string(), Arc::new(callback)));

        debug!(behavior = name, id, "behavior registered");
        Some(id)
    }

    /// Remove one listener. Returns `true` if it was registered.
    pub async fn unregister(&self, id: BehaviorId) -> bool {
        let _guard = self.lock.lock().await;
        let mut registry = self.registry.lock();
        let Some((name, _)) = registry.by_id.remove(&id) else {
            return false;
        };
        if let Some(ids) = registry.by_name.get_mut(&name) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                registry.by_name.remove(&name);
            }
        }
        debug!(behavior = %name, id, "behavior unregistered");
        true
    }

    /// Call every listener of `name` with a `null` payload.
    pub fn trigger(&self, name: &str) {
        self.trigger_with(name, &Value::Null);
    }

    /// Call every listener of `name` with `payload`, in registration order.
    ///
    /// A name without listeners is a no-op.
    pub fn trigger_with(&self, name: &str, payload: &Value) {
        if let Some(catalog) = &self.catalog
            && !catalog.declares_behavior(name)
        {
            warn!(behavior = name, "triggering undeclared behavior");
        }

        // Listeners run outside the registry mutex so they may register more.
        let listeners: Vec<Listener> = {
            let registry = self.registry.lock();
            registry
                .by_name
                .get(name)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| registry.by_id.get(id).map(|(_, l)| Arc::clone(l)))
                        .collect()
                })
                .unwrap_or_default()
        };

        if listeners.is_empty() {
            debug!(behavior = name, "no listeners");
            return;
        }
        for listener in listeners {
            listener(payload);
        }
    }

    /// Listener ids registered under `name`, in registration order.
    pub fn ids_for(&self, name: &str) -> Vec<BehaviorId> {
        self.registry
            .lock()
            .by_name
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Behavior name a listener id belongs to.
    pub fn name_of(&self, id: BehaviorId) -> Option<String> {
        self.registry
            .lock()
            .by_id
            .get(&id)
            .map(|(name, _)| name.clone())
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        self.registry.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

impl Default for BehaviorBus {
    fn default() -> Self {
        Self::new()
    }
}

//! Subsystem composition with visibility-scoped views.
//!
//! A subsystem is a plain value: a name, some JSON data and a set of named
//! methods, each tagged with a [`Visibility`]. Registering it yields the
//! owner's [`SubsystemHandle`]; everyone else looks it up by name and gets
//! a [`PublicView`] or [`ProtectedView`], which expose the data read-only
//! and only the methods their visibility allows.

use crate::error::{InitError, InitResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Who may call a method. Ordered from least to most restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Any holder of a view.
    Public,
    /// Protected views and the owner.
    Protected,
    /// The owner only.
    Private,
}

/// A subsystem method: receives a snapshot of the data and call arguments.
pub type Method = Arc<dyn Fn(&Value, &Value) -> InitResult<Value> + Send + Sync>;

/// Subsystem definition, consumed by [`SubsystemRegistry::register`].
pub struct Subsystem {
    name: String,
    data: Value,
    methods: BTreeMap<String, (Visibility, Method)>,
}

impl Subsystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Value::Null,
            methods: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Add a method. A later method with the same name replaces the earlier.
    pub fn method<F>(mut self, name: impl Into<String>, visibility: Visibility, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> InitResult<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), (visibility, Arc::new(f)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Shared {
    name: String,
    data: RwLock<Value>,
    methods: BTreeMap<String, (Visibility, Method)>,
}

impl Shared {
    fn call(&self, method: &str, args: &Value, allowed: Visibility) -> InitResult<Value> {
        let (visibility, f) = self
            .methods
            .get(method)
            .ok_or_else(|| InitError::method_not_found(&self.name, method))?;
        if *visibility > allowed {
            return Err(InitError::access_denied(&self.name, method));
        }
        // Snapshot so the method may reach back into the subsystem.
        let data = self.data.read().clone();
        f(&data, args)
    }

    fn methods(&self, allowed: Visibility) -> Vec<&str> {
        self.methods
            .iter()
            .filter(|(_, (visibility, _))| *visibility <= allowed)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Owner view: read-write data and every method.
#[derive(Clone)]
pub struct SubsystemHandle {
    inner: Arc<Shared>,
}

impl std::fmt::Debug for SubsystemHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsystemHandle")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl SubsystemHandle {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn data(&self) -> Value {
        self.inner.data.read().clone()
    }

    pub fn set_data(&self, data: Value) {
        *self.inner.data.write() = data;
    }

    /// Mutate the data in place.
    pub fn update_data<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut *self.inner.data.write())
    }

    pub fn call(&self, method: &str, args: &Value) -> InitResult<Value> {
        self.inner.call(method, args, Visibility::Private)
    }

    pub fn methods(&self) -> Vec<&str> {
        self.inner.methods(Visibility::Private)
    }
}

/// Read-only data, public and protected methods.
#[derive(Clone)]
pub struct ProtectedView {
    inner: Arc<Shared>,
}

impl ProtectedView {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn data(&self) -> Value {
        self.inner.data.read().clone()
    }

    pub fn call(&self, method: &str, args: &Value) -> InitResult<Value> {
        self.inner.call(method, args, Visibility::Protected)
    }

    pub fn methods(&self) -> Vec<&str> {
        self.inner.methods(Visibility::Protected)
    }
}

/// Read-only data and public methods.
#[derive(Clone)]
pub struct PublicView {
    inner: Arc<Shared>,
}

impl PublicView {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn data(&self) -> Value {
        self.inner.data.read().clone()
    }

    pub fn call(&self, method: &str, args: &Value) -> InitResult<Value> {
        self.inner.call(method, args, Visibility::Public)
    }

    pub fn methods(&self) -> Vec<&str> {
        self.inner.methods(Visibility::Public)
    }
}

/// Lookup table of registered subsystems.
#[derive(Default)]
pub struct SubsystemRegistry {
    entries: RwLock<BTreeMap<String, Arc<Shared>>>,
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subsystem and return its owner handle.
    pub fn register(&self, subsystem: Subsystem) -> InitResult<SubsystemHandle> {
        let mut entries = self.entries.write();
        if entries.contains_key(&subsystem.name) {
            return Err(InitError::duplicate_subsystem(&subsystem.name));
        }

        let shared = Arc::new(Shared {
            name: subsystem.name.clone(),
            data: RwLock::new(subsystem.data),
            methods: subsystem.methods,
        });
        entries.insert(subsystem.name, Arc::clone(&shared));
        debug!(subsystem = %shared.name, methods = shared.methods.len(), "subsystem registered");
        Ok(SubsystemHandle { inner: shared })
    }

    pub fn public(&self, name: &str) -> InitResult<PublicView> {
        self.lookup(name).map(|inner| PublicView { inner })
    }

    pub fn protected(&self, name: &str) -> InitResult<ProtectedView> {
        self.lookup(name).map(|inner| ProtectedView { inner })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, name: &str) -> InitResult<Arc<Shared>> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| InitError::subsystem_not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn counter() -> Subsystem {
        Subsystem::new("counter")
            .with_data(json!({"count": 1}))
            .method("get", Visibility::Public, |data, _| Ok(data["count"].clone()))
            .method("add", Visibility::Protected, |data, args| {
                let sum = data["count"].as_i64().unwrap_or(0) + args.as_i64().unwrap_or(0);
                Ok(json!(sum))
            })
            .method("reset", Visibility::Private, |_, _| Ok(json!(0)))
    }

    #[test]
    fn test_views_enforce_visibility() {
        let registry = SubsystemRegistry::new();
        let owner = registry.register(counter()).unwrap();

        let public = registry.public("counter").unwrap();
        assert_eq!(public.call("get", &Value::Null).unwrap(), json!(1));
        let err = public.call("add", &json!(2)).unwrap_err();
        assert_eq!(err.code, ErrorCode::AccessDenied);
        assert_eq!(public.methods(), vec!["get"]);

        let protected = registry.protected("counter").unwrap();
        assert_eq!(protected.call("add", &json!(2)).unwrap(), json!(3));
        let err = protected.call("reset", &Value::Null).unwrap_err();
        assert_eq!(err.code, ErrorCode::AccessDenied);

        assert_eq!(owner.call("reset", &Value::Null).unwrap(), json!(0));
        assert_eq!(owner.methods(), vec!["add", "get", "reset"]);
    }

    #[test]
    fn test_owner_writes_are_visible_to_views() {
        let registry = SubsystemRegistry::new();
        let owner = registry.register(counter()).unwrap();
        let public = registry.public("counter").unwrap();

        owner.update_data(|data| data["count"] = json!(10));
        assert_eq!(public.data()["count"], 10);
        assert_eq!(public.call("get", &Value::Null).unwrap(), json!(10));

        owner.set_data(json!({"count": 0}));
        assert_eq!(owner.data(), json!({"count": 0}));
    }

    #[test]
    fn test_duplicate_and_missing() {
        let registry = SubsystemRegistry::new();
        registry.register(counter()).unwrap();

        let err = registry.register(counter()).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateSubsystem);

        let err = registry.public("nope").err().unwrap();
        assert_eq!(err.code, ErrorCode::SubsystemNotFound);

        let err = registry
            .public("counter")
            .unwrap()
            .call("missing", &Value::Null)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MethodNotFound);

        assert_eq!(registry.names(), vec!["counter"]);
        assert!(registry.contains("counter"));
    }
}

//! Application bootstrap.
//!
//! Loads the configuration tree, then builds the pieces that read from it:
//! the [`Catalog`] of declared errors and behaviors, a [`BehaviorBus`] bound
//! to that catalog, and a [`SubsystemRegistry`] holding one subsystem per
//! entry of the optional `subsystems` section.

use crate::behaviors::BehaviorBus;
use crate::catalog::Catalog;
use crate::config::{ConfigTree, Settings};
use crate::error::{InitError, InitResult};
use crate::subsystems::{Subsystem, SubsystemHandle, SubsystemRegistry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Turns [`Settings`] into a running [`Application`].
#[derive(Debug, Clone)]
pub struct Bootstrap {
    settings: Settings,
}

impl Bootstrap {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Load the tree and wire everything built from it.
    ///
    /// Nothing is returned unless the whole tree loaded.
    pub async fn run(self) -> InitResult<Application> {
        let loader = &self.settings.loader;
        let tree = ConfigTree::from_settings(loader);
        let config = tree.load(&loader.init_path, &loader.init_file).await?;

        let catalog = Arc::new(Catalog::from_tree(&config)?);
        let bus = BehaviorBus::with_capacity(self.settings.bus.capacity)
            .with_catalog(Arc::clone(&catalog));

        let registry = SubsystemRegistry::new();
        let mut subsystems = BTreeMap::new();
        match config.get("subsystems") {
            None | Some(Value::Null) => {}
            Some(Value::Object(entries)) => {
                for (name, data) in entries {
                    let handle =
                        registry.register(Subsystem::new(name.clone()).with_data(data.clone()))?;
                    subsystems.insert(name.clone(), handle);
                }
            }
            Some(_) => {
                return Err(InitError::invalid_settings(
                    "subsystems section must be a mapping",
                ));
            }
        }

        info!(
            subsystems = subsystems.len(),
            behaviors = catalog.behaviors().count(),
            "application bootstrapped"
        );

        Ok(Application {
            settings: self.settings,
            config,
            catalog,
            bus,
            registry,
            subsystems,
        })
    }
}

/// A fully loaded application.
pub struct Application {
    settings: Settings,
    config: Value,
    catalog: Arc<Catalog>,
    bus: BehaviorBus,
    registry: SubsystemRegistry,
    subsystems: BTreeMap<String, SubsystemHandle>,
}

impl Application {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The loaded configuration tree.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Look up a value by dotted path, e.g. `"database.host"`.
    pub fn setting(&self, dotted: &str) -> Option<&Value> {
        dotted
            .split('.')
            .filter(|part| !part.is_empty())
            .try_fold(&self.config, |value, part| match value {
                Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => value.get(part),
            })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn bus(&self) -> &BehaviorBus {
        &self.bus
    }

    pub fn subsystems(&self) -> &SubsystemRegistry {
        &self.registry
    }

    /// Owner handle of a subsystem created from the `subsystems` section.
    pub fn subsystem(&self, name: &str) -> Option<&SubsystemHandle> {
        self.subsystems.get(name)
    }
}

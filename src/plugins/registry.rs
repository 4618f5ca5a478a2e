//! Plugin Registry
//!
//! Compile-time mapping from plugin names to enrichment factories. This is the
//! default search location of the loader; extension crates add their own
//! plugins through [`PluginRegistry::register`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::configs::Settings;
use crate::core::error::LogError;
use crate::plugins::enrich::Enrichment;
use crate::plugins::{heap, sentry, system};

pub type PluginFactory = Arc<dyn Fn(&Settings) -> Result<Enrichment, LogError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `heap`, `system` and `sentry`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("heap", heap::plugin);
        registry.register("system", system::plugin);
        registry.register("sentry", sentry::plugin);
        registry
    }

    /// Register (or replace) the factory for `name`.
    ///
    /// Names starting with `_` can be registered but are only reachable through
    /// a manifest's `extends`, never from the configured plugin list.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Settings) -> Result<Enrichment, LogError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// `None` when no plugin of that name is registered.
    pub fn build(&self, name: &str, settings: &Settings) -> Option<Result<Enrichment, LogError>> {
        self.factories.get(name).map(|factory| factory(settings))
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

//! Plugin Loader
//!
//! Turns the configured plugin list into one [`Pipeline`]. Names are resolved
//! against each search path in order; the first path that yields an
//! enrichment wins. Names that resolve nowhere are reported on the given
//! handle and left out.

use serde_json::{Value, json};
use std::fmt;
use std::path::{MAIN_SEPARATOR, PathBuf};

use crate::configs::Settings;
use crate::core::error::LogError;
use crate::loggers::core::{Fields, Message, fields};
use crate::loggers::handle::LogHandle;
use crate::plugins::enrich::{Enrichment, Pipeline};
use crate::plugins::manifest::PluginManifest;
use crate::plugins::registry::PluginRegistry;

pub const PLUGIN_DELIMITER: char = ',';

/// Leading character of the reserved, never-configurable namespace.
pub const PRIVATE_PREFIX: char = '_';

pub fn parse_plugin_names(raw: &str) -> Vec<String> {
    raw.split(PLUGIN_DELIMITER)
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.starts_with(PRIVATE_PREFIX))
        .map(str::to_string)
        .collect()
}

/// Absolute form of a custom plugin directory with trailing separators removed.
/// Blank input yields `None`.
pub fn normalize_search_path(raw: Option<&str>) -> Option<PathBuf> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let trimmed = raw.trim_end_matches(|c: char| c == '/' || c == MAIN_SEPARATOR);
    let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
    std::path::absolute(trimmed).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPath {
    /// Directory of plugin manifests.
    Dir(PathBuf),
    /// The compiled-in plugin registry.
    Builtin,
}

impl fmt::Display for SearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPath::Dir(dir) => write!(f, "{}", dir.display()),
            SearchPath::Builtin => f.write_str("<builtin>"),
        }
    }
}

pub struct PluginLoader<'a> {
    registry: &'a PluginRegistry,
    settings: &'a Settings,
}

impl<'a> PluginLoader<'a> {
    pub fn new(registry: &'a PluginRegistry, settings: &'a Settings) -> Self {
        Self { registry, settings }
    }

    /// The custom directory (if configured) followed by the built-in registry.
    pub fn search_paths(&self) -> Vec<SearchPath> {
        self.settings
            .search_path()
            .map(SearchPath::Dir)
            .into_iter()
            .chain(std::iter::once(SearchPath::Builtin))
            .collect()
    }

    pub fn resolve(&self, name: &str, paths: &[SearchPath]) -> Result<Enrichment, LogError> {
        let mut last_err = None;

        for path in paths {
            let attempt = match path {
                SearchPath::Dir(dir) => PluginManifest::find(dir, name).map(|file| {
                    PluginManifest::load(&file)?.into_enrichment(name, self.registry, self.settings)
                }),
                SearchPath::Builtin => self.registry.build(name, self.settings),
            };

            match attempt {
                Some(Ok(enrichment)) => return Ok(enrichment),
                Some(Err(e)) => last_err = Some(e),
                None => {}
            }
        }

        Err(last_err.unwrap_or_else(|| LogError::plugin(name, "not found in any search path")))
    }

    /// Resolves the configured plugin list.
    pub fn load(&self, reporter: &dyn LogHandle) -> Pipeline {
        self.load_names(&self.settings.plugin_names(), &self.search_paths(), reporter)
    }

    pub fn load_names(&self, names: &[String], paths: &[SearchPath], reporter: &dyn LogHandle) -> Pipeline {
        let searched: Vec<Value> = paths.iter().map(|p| Value::String(p.to_string())).collect();

        let resolved = names.iter().filter_map(|name| match self.resolve(name, paths) {
            Ok(enrichment) => {
                reporter.debug(
                    plugin_fields(name, &searched),
                    Message::from(format!("Loaded log plugin {}", name)),
                );
                Some(enrichment)
            }
            Err(e) => {
                let mut data = plugin_fields(name, &searched);
                data.insert("error".into(), Value::String(e.to_string()));
                reporter.error(data, Message::from(format!("Could not load log plugin {}", name)));
                None
            }
        });

        Pipeline::compose(resolved)
    }
}

fn plugin_fields(name: &str, searched: &[Value]) -> Fields {
    fields(json!({ "plugin": name, "search_paths": searched }))
}

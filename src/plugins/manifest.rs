//! Declarative plugins read from a plugin directory.
//!
//! `<dir>/<name>.toml` (or `.json`):
//!
//! ```toml
//! levels = ["error", "fatal"]
//! extends = "heap"
//!
//! [fields]
//! team = "payments"
//! ```

use figment::{Figment, providers::{Format, Json, Toml}};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::configs::Settings;
use crate::core::error::LogError;
use crate::loggers::core::{Fields, LogLevel};
use crate::plugins::enrich::Enrichment;
use crate::plugins::registry::PluginRegistry;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PluginManifest {
    pub levels: Vec<LogLevel>,
    pub fields: Fields,
    pub extends: Option<String>,
}

impl PluginManifest {
    /// First existing `<name>.toml` / `<name>.json` in `dir`. Names that could
    /// leave `dir` (separators, `..`) never match.
    pub fn find(dir: &Path, name: &str) -> Option<PathBuf> {
        if name.contains(['/', '\\']) || name.contains("..") {
            return None;
        }

        ["toml", "json"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
    }

    pub fn load(path: &Path) -> Result<Self, LogError> {
        let figment = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Figment::from(Toml::file(path)),
            _ => Figment::from(Json::file(path)),
        };

        figment
            .extract()
            .map_err(|e| LogError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn into_enrichment(
        self,
        name: &str,
        registry: &PluginRegistry,
        settings: &Settings,
    ) -> Result<Enrichment, LogError> {
        let PluginManifest { levels, fields, extends } = self;

        let base = match extends.as_deref() {
            Some(parent) => Some(registry.build(parent, settings).ok_or_else(|| {
                LogError::plugin(name, format!("extends unknown plugin `{}`", parent))
            })??),
            None => None,
        };

        let enrichment = match base {
            Some(base) if fields.is_empty() => base,
            Some(base) => {
                let levels = base.levels().to_vec();
                Enrichment::wrap(
                    move |data, msg| {
                        data.extend(fields.clone());
                        base.invoke(data, msg);
                    },
                    &levels,
                )
            }
            None if fields.is_empty() => {
                return Err(LogError::plugin(name, "manifest declares neither `fields` nor `extends`"));
            }
            None => Enrichment::wrap(move |data, _msg| data.extend(fields.clone()), &[]),
        };

        Ok(if levels.is_empty() {
            enrichment
        } else {
            enrichment.with_levels(&levels)
        })
    }
}

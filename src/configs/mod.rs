use figment::{Figment, providers::{Env, Format, Json, Serialized, Toml}};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use crate::core::error::LogError;
use crate::loggers::core::LogLevel;
use crate::plugins::loader::{normalize_search_path, parse_plugin_names};

/// Startup settings. Every key can be overridden by a `LOG_`-prefixed env var.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Comma-delimited plugin names, e.g. `"sentry,heap"`.
    pub plugins: String,
    /// Extra directory searched for plugin manifests before the built-ins.
    pub plugins_path: Option<String>,
    /// Minimum active level.
    pub level: String,
    /// Human-readable lines. Like the other switches, accepts `true`/`false`,
    /// `1`/`0`, `yes`/`no` and `on`/`off`.
    #[serde(deserialize_with = "flag")]
    pub pretty: bool,
    /// Exception tracker endpoint or DSN, consumed by the `sentry` plugin only.
    pub error_endpoint: Option<String>,
    /// Stamp an uppercase `_label` field on every dispatched record.
    #[serde(deserialize_with = "flag")]
    pub label: bool,
    /// Set the handle's level to the requested one on each dispatch.
    #[serde(deserialize_with = "flag")]
    pub force_level: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plugins: String::new(),
            plugins_path: None,
            level: LogLevel::Info.as_str().to_string(),
            pretty: false,
            error_endpoint: None,
            label: false,
            force_level: false,
        }
    }
}

impl Settings {
    /// Defaults, then `SENTRY_DSN`, then `LOG_*`.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::raw().only(&["SENTRY_DSN"]).map(|_| "error_endpoint".into()))
            .merge(Env::prefixed("LOG_"))
    }

    pub fn from_env() -> Result<Self, LogError> {
        Self::figment()
            .extract()
            .map_err(|e| LogError::ConfigError(e.to_string()))
    }

    /// LOCAL: Merges file + LOG_ env vars. Fails if file missing.
    pub fn from_file(path: &str) -> Result<Self, LogError> {
        let file = Path::new(path);
        if !file.exists() {
            return Err(LogError::ConfigError(format!("Local file not found: {}", path)));
        }

        let base = Figment::from(Serialized::defaults(Settings::default()));
        let base = match file.extension().and_then(|e| e.to_str()) {
            Some("toml") => base.merge(Toml::file(file)),
            _ => base.merge(Json::file(file)),
        };

        base.merge(Env::raw().only(&["SENTRY_DSN"]).map(|_| "error_endpoint".into()))
            .merge(Env::prefixed("LOG_"))
            .extract()
            .map_err(|e| LogError::ConfigError(e.to_string()))
    }

    pub fn min_level(&self) -> Result<LogLevel, LogError> {
        self.level.parse()
    }

    pub fn plugin_names(&self) -> Vec<String> {
        parse_plugin_names(&self.plugins)
    }

    pub fn search_path(&self) -> Option<PathBuf> {
        normalize_search_path(self.plugins_path.as_deref())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Env vars arrive as `true`, `1` or `"on"` depending on who set them.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(value) => Ok(value),
        RawFlag::Int(0) => Ok(false),
        RawFlag::Int(1) => Ok(true),
        RawFlag::Int(other) => Err(serde::de::Error::custom(format!("expected 0 or 1, found {}", other))),
        RawFlag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("expected a boolean, found `{}`", other))),
        },
    }
}

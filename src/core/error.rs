//! Errors returned by setup calls (`init`, `meta`, settings loading) and
//! carried in plugin failure reports.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Serialize)]
pub enum LogError {
    /// Error related to settings loading or a required startup argument.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A caller passed an argument the operation cannot work with.
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// A level name that is not one of trace, debug, info, warn, error, fatal.
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    /// A configured plugin could not be resolved or constructed.
    #[error("Plugin `{name}` unavailable: {details}")]
    PluginError {
        /// The configured plugin name.
        name: String,
        /// Why resolution or construction failed.
        details: String,
    },

    /// Exception tracker transport failure.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Error related to internal logic or state.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LogError {
    pub(crate) fn plugin(name: &str, details: impl Into<String>) -> Self {
        LogError::PluginError {
            name: name.to_string(),
            details: details.into(),
        }
    }
}

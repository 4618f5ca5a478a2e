//! # Dispatch
//!
//! A [`Dispatcher`] is what application code logs through. It normalizes the
//! loose call shape (`level`, `msg`, `data`, or just an error), makes sure the
//! context's plugin pipeline is loaded, runs the enrichment stages that target
//! the level and hands the record to its handle.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::context::Shared;
use crate::core::error::LogError;
use crate::loggers::core::{ErrorValue, Fields, LogLevel, Message, fields};
use crate::loggers::handle::LogHandle;

pub const MISSING_ARGUMENTS: &str = "level or msg arguments required";

/// Uppercase level name stamped into records when labelling is enabled.
pub const LABEL_FIELD: &str = "_label";

/// First argument of a call: a level name, or an error that implies `error` level.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Level(String),
    Error(ErrorValue),
}

impl From<&str> for Target {
    fn from(level: &str) -> Self {
        Target::Level(level.to_string())
    }
}

impl From<String> for Target {
    fn from(level: String) -> Self {
        Target::Level(level)
    }
}

impl From<LogLevel> for Target {
    fn from(level: LogLevel) -> Self {
        Target::Level(level.as_str().to_string())
    }
}

impl From<ErrorValue> for Target {
    fn from(err: ErrorValue) -> Self {
        Target::Error(err)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogCall {
    pub target: Option<Target>,
    pub msg: Option<Message>,
    pub data: Option<Fields>,
}

impl LogCall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn msg(mut self, msg: impl Into<Message>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn data(mut self, data: Fields) -> Self {
        self.data = Some(data);
        self
    }

    /// Applies the defaults (`info`, empty message, empty record). An error
    /// target replaces the message and forces the `error` level.
    pub fn normalize(self) -> (String, Message, Fields) {
        let data = self.data.unwrap_or_default();
        match self.target {
            Some(Target::Error(err)) => (LogLevel::Error.as_str().to_string(), Message::Error(err), data),
            Some(Target::Level(level)) => (level, self.msg.unwrap_or_default(), data),
            None => (LogLevel::Info.as_str().to_string(), self.msg.unwrap_or_default(), data),
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    handle: Arc<dyn LogHandle>,
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub(crate) fn new(handle: Arc<dyn LogHandle>, shared: Arc<Shared>) -> Self {
        Self { handle, shared }
    }

    pub fn handle(&self) -> &Arc<dyn LogHandle> {
        &self.handle
    }

    /// Never fails: malformed calls are reported on the handle's error level.
    pub fn call(&self, call: LogCall) {
        let (level, msg, data) = call.normalize();

        if level.trim().is_empty() || msg.is_empty() {
            self.handle.error(Fields::new(), Message::Error(ErrorValue::new("Error", MISSING_ARGUMENTS)));
            return;
        }

        match level.parse::<LogLevel>() {
            Ok(level) => self.emit(level, msg, data),
            Err(e) => self.handle.error(
                fields(serde_json::json!({ "level": level })),
                Message::Error(ErrorValue::from_error(&e)),
            ),
        }
    }

    pub fn log(&self, level: impl Into<Target>, msg: impl Into<Message>, data: Fields) {
        self.call(LogCall::new().level(level).msg(msg).data(data));
    }

    /// Logs `err` at error level.
    pub fn report<E: std::error::Error + ?Sized>(&self, err: &E) {
        self.call(LogCall::new().level(ErrorValue::from_error(err)));
    }

    /// Child dispatcher bound to this one's handle plus `options`.
    pub fn meta(&self, options: Fields) -> Result<Dispatcher, LogError> {
        if options.is_empty() {
            return Err(LogError::ArgumentError("meta requires a non-empty metadata record".into()));
        }
        Ok(Dispatcher::new(self.handle.child(options), self.shared.clone()))
    }

    fn emit(&self, level: LogLevel, msg: Message, mut data: Fields) {
        let pipeline = self.shared.pipeline(self.handle.as_ref());

        if self.shared.settings.force_level && self.handle.level() != level {
            self.handle.set_level(level);
        }
        if !self.handle.is_enabled(level) {
            return;
        }

        pipeline.run(level, &mut data, &msg);
        if self.shared.settings.label {
            data.insert(LABEL_FIELD.to_string(), Value::String(level.label().to_string()));
        }

        self.handle.write(level, data, msg);
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.handle.name())
            .field("level", &self.handle.level())
            .finish_non_exhaustive()
    }
}

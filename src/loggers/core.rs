use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::core::error::LogError;

/// Structured data attached to a log call.
pub type Fields = Map<String, Value>;

/// Turns a `serde_json::json!` object into `Fields`. Non-object values yield an empty record.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Child keys win on collision; the parent record is left untouched.
pub fn merge_bindings(parent: &Fields, child: Fields) -> Fields {
    let mut merged = parent.clone();
    merged.extend(child);
    merged
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace, Debug, Info, Warn, Error, Fatal,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    /// Uppercase name, as stamped into the `_label` field.
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Numeric rank used by backends for filtering.
    pub fn rank(&self) -> u8 {
        match self {
            LogLevel::Trace => 10,
            LogLevel::Debug => 20,
            LogLevel::Info => 30,
            LogLevel::Warn => 40,
            LogLevel::Error => 50,
            LogLevel::Fatal => 60,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LogError::UnknownLevel(wanted.to_string()))
    }
}

/// Accepts the same spellings as `FromStr`, so `"ERROR"` in a manifest works.
impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Serializable description of an error passed as a log message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorValue {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    /// Captures a Rust error. The `stack` holds the `source()` chain, one cause per line.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let full = std::any::type_name::<E>();
        // `dyn core::error::Error + Send + Sync` keeps only the principal trait
        let kind = full
            .split(['<', '+'])
            .next()
            .unwrap_or(full)
            .trim()
            .rsplit("::")
            .next()
            .unwrap_or("Error");

        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self::new(kind, err.to_string())
            .with_stack(if causes.is_empty() { None } else { Some(causes.join("\n")) })
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// The message half of a log call: plain text or an error value.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    Error(ErrorValue),
}

impl Message {
    /// An error message is never empty, even with blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            Message::Text(text) => text.is_empty(),
            Message::Error(_) => false,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Message::Text(text) => text,
            Message::Error(err) => &err.message,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Message::Error(err) => Some(err),
            Message::Text(_) => None,
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Message::Text(String::new())
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<ErrorValue> for Message {
    fn from(err: ErrorValue) -> Self {
        Message::Error(err)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.write_str(text),
            Message::Error(err) => err.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub ts: DateTime<Utc>,
    pub level: LogLevel,
    pub msg: String,
    pub name: String,
    pub ctx: Fields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<ErrorValue>,
}

impl LogRecord {
    /// Builds a record; `bindings` go first so call data can shadow them.
    pub fn new(level: LogLevel, name: &str, bindings: &Fields, data: Fields, msg: Message) -> Self {
        let (msg, err) = match msg {
            Message::Text(text) => (text, None),
            Message::Error(err) => (err.message.clone(), Some(err)),
        };

        Self {
            ts: Utc::now(),
            level,
            msg,
            name: name.to_string(),
            ctx: merge_bindings(bindings, data),
            err,
        }
    }
}

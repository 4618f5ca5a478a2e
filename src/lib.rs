pub mod core;
pub mod configs;
pub mod context;
pub mod dispatch;
pub mod loggers;
pub mod plugins;

pub use crate::core::error::LogError;
pub use configs::Settings;
pub use context::{BackendOptions, InitArgs, LogContext};
pub use dispatch::{Dispatcher, LogCall, Target};
pub use loggers::core::{ErrorValue, Fields, LogLevel, Message, fields};
pub use loggers::handle::LogHandle;

#[doc(hidden)]
pub use serde_json;

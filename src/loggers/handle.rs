//! The capability object every backend logger exposes to the dispatch core.

use std::sync::Arc;

use crate::loggers::core::{Fields, LogLevel, Message};

/// A leveled logger: one call site per severity, a live minimum level and
/// child derivation with merged metadata.
///
/// Implementations must treat `write` for a disabled level as a no-op.
pub trait LogHandle: Send + Sync {
    fn name(&self) -> String;

    fn level(&self) -> LogLevel;

    fn set_level(&self, level: LogLevel);

    fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    /// Metadata bound to this handle through `child`.
    fn bindings(&self) -> Fields;

    fn write(&self, level: LogLevel, data: Fields, msg: Message);

    /// Derives a handle carrying `bindings` on top of this one's. Never mutates `self`.
    fn child(&self, bindings: Fields) -> Arc<dyn LogHandle>;

    fn trace(&self, data: Fields, msg: Message) {
        self.write(LogLevel::Trace, data, msg);
    }

    fn debug(&self, data: Fields, msg: Message) {
        self.write(LogLevel::Debug, data, msg);
    }

    fn info(&self, data: Fields, msg: Message) {
        self.write(LogLevel::Info, data, msg);
    }

    fn warn(&self, data: Fields, msg: Message) {
        self.write(LogLevel::Warn, data, msg);
    }

    fn error(&self, data: Fields, msg: Message) {
        self.write(LogLevel::Error, data, msg);
    }

    fn fatal(&self, data: Fields, msg: Message) {
        self.write(LogLevel::Fatal, data, msg);
    }
}

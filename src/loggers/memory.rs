//! In-memory backend that records every enabled write.
//!
//! Used as a `set_logger` substitute in tests and by hosts that want to
//! inspect what would have been logged.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::loggers::core::{Fields, LogLevel, Message, merge_bindings};
use crate::loggers::handle::LogHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub level: LogLevel,
    pub data: Fields,
    pub msg: Message,
    pub bindings: Fields,
}

/// Clones and children share the entry list and the child counter.
#[derive(Clone)]
pub struct MemoryLogger {
    name: String,
    level: Arc<ArcSwap<LogLevel>>,
    bindings: Arc<Fields>,
    entries: Arc<Mutex<Vec<Entry>>>,
    children: Arc<AtomicUsize>,
}

impl MemoryLogger {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: Arc::new(ArcSwap::from_pointee(LogLevel::Info)),
            bindings: Arc::new(Fields::new()),
            entries: Arc::new(Mutex::new(Vec::new())),
            children: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        self.level.store(Arc::new(level));
        self
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries().iter().filter(|e| e.level == level).count()
    }

    /// Number of `child` derivations made from this logger or its clones.
    pub fn child_count(&self) -> usize {
        self.children.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogHandle for MemoryLogger {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn level(&self) -> LogLevel {
        **self.level.load()
    }

    fn set_level(&self, level: LogLevel) {
        self.level.store(Arc::new(level));
    }

    fn bindings(&self) -> Fields {
        self.bindings.as_ref().clone()
    }

    fn write(&self, level: LogLevel, data: Fields, msg: Message) {
        if !self.is_enabled(level) {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Entry {
                level,
                data,
                msg,
                bindings: self.bindings(),
            });
    }

    fn child(&self, bindings: Fields) -> Arc<dyn LogHandle> {
        self.children.fetch_add(1, Ordering::SeqCst);
        Arc::new(MemoryLogger {
            name: self.name.clone(),
            level: Arc::new(ArcSwap::from_pointee(self.level())),
            bindings: Arc::new(merge_bindings(&self.bindings, bindings)),
            entries: self.entries.clone(),
            children: self.children.clone(),
        })
    }
}

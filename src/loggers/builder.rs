use tokio::sync::mpsc;
use crate::core::error::LogError;
use crate::loggers::worker::LogWorker;
use crate::loggers::core::{Fields, LogLevel, LogRecord, Message, merge_bindings};
use crate::loggers::handle::LogHandle;
use std::sync::Arc;
use arc_swap::ArcSwap;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub name: String,
}

/// Default backend: records go to a `LogWorker` over a bounded channel.
#[derive(Clone)]
pub struct Logger {
    pub sender: mpsc::Sender<LogRecord>,
    pub config: Arc<ArcSwap<LoggerConfig>>,
    pub bindings: Arc<Fields>,
}

impl Logger {
    pub fn new(sender: mpsc::Sender<LogRecord>, config: LoggerConfig) -> Self {
        Self {
            sender,
            config: Arc::new(ArcSwap::from_pointee(config)),
            bindings: Arc::new(Fields::new()),
        }
    }
}

impl LogHandle for Logger {
    fn name(&self) -> String {
        self.config.load().name.clone()
    }

    fn level(&self) -> LogLevel {
        self.config.load().level
    }

    fn set_level(&self, level: LogLevel) {
        let name = self.config.load().name.clone();
        self.config.store(Arc::new(LoggerConfig { level, name }));
    }

    fn bindings(&self) -> Fields {
        self.bindings.as_ref().clone()
    }

    fn write(&self, level: LogLevel, data: Fields, msg: Message) {
        let cfg = self.config.load();
        if level < cfg.level {
            return;
        }

        let record = LogRecord::new(level, &cfg.name, &self.bindings, data, msg);
        // best-effort send; a full or closed channel drops the record
        let _ = self.sender.try_send(record);
    }

    fn child(&self, bindings: Fields) -> Arc<dyn LogHandle> {
        let cfg = self.config.load_full();
        Arc::new(Logger {
            sender: self.sender.clone(),
            config: Arc::new(ArcSwap::new(cfg)),
            bindings: Arc::new(merge_bindings(&self.bindings, bindings)),
        })
    }
}

pub struct LoggerBuilder {
    name: String,
    level: LogLevel,
    buffer_size: usize,
    pretty: bool,
}

impl LoggerBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: LogLevel::Info,
            buffer_size: 1024,
            pretty: false,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Spawns the worker on the current tokio runtime.
    pub fn build(self) -> Result<Logger, LogError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            LogError::ConfigError("logger backend requires a running tokio runtime".into())
        })?;

        let (tx, rx) = mpsc::channel(self.buffer_size);
        let worker = LogWorker::new(rx, self.pretty);
        runtime.spawn(async move {
            worker.run().await;
        });

        Ok(Logger::new(tx, LoggerConfig {
            level: self.level,
            name: self.name,
        }))
    }
}

//! # Logging Context
//!
//! Owns everything that is process-wide in a logging setup: the settings, the
//! plugin registry, the backend constructor, the current handle and the
//! combined plugin pipeline. Clones share state, so a host creates one
//! context at startup and passes it (or the dispatchers it hands out) around.

use arc_swap::{ArcSwap, ArcSwapOption};
use std::sync::{Arc, OnceLock};

use crate::configs::Settings;
use crate::core::error::LogError;
use crate::dispatch::Dispatcher;
use crate::loggers::builder::LoggerBuilder;
use crate::loggers::core::{Fields, LogLevel};
use crate::loggers::handle::LogHandle;
use crate::plugins::enrich::Pipeline;
use crate::plugins::loader::PluginLoader;
use crate::plugins::registry::PluginRegistry;

/// What a backend constructor is given by `init`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendOptions {
    pub name: String,
    pub level: LogLevel,
    pub pretty: bool,
}

pub type BackendFactory =
    Arc<dyn Fn(&BackendOptions) -> Result<Arc<dyn LogHandle>, LogError> + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    pub name: String,
    /// Overrides `Settings::pretty` when set.
    pub pretty: Option<bool>,
    /// Default metadata bound to the root handle.
    pub base: Option<Fields>,
}

impl InitArgs {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = Some(pretty);
        self
    }

    pub fn base(mut self, base: Fields) -> Self {
        self.base = Some(base);
        self
    }
}

pub(crate) struct Shared {
    pub(crate) settings: Settings,
    registry: PluginRegistry,
    backend: ArcSwap<BackendFactory>,
    current: ArcSwapOption<Arc<dyn LogHandle>>,
    pipeline: OnceLock<Pipeline>,
}

impl Shared {
    /// Loads the plugin pipeline on first use; later calls return the same one.
    pub(crate) fn pipeline(&self, reporter: &dyn LogHandle) -> &Pipeline {
        self.pipeline
            .get_or_init(|| PluginLoader::new(&self.registry, &self.settings).load(reporter))
    }

    fn current(&self) -> Option<Arc<dyn LogHandle>> {
        self.current.load_full().map(|handle| handle.as_ref().clone())
    }
}

#[derive(Clone)]
pub struct LogContext {
    shared: Arc<Shared>,
}

impl LogContext {
    /// Context with the built-in plugins and the default `Logger` backend.
    pub fn new(settings: Settings) -> Self {
        Self::with_registry(settings, PluginRegistry::with_builtins())
    }

    pub fn with_registry(settings: Settings, registry: PluginRegistry) -> Self {
        let backend: BackendFactory = Arc::new(default_backend);
        Self {
            shared: Arc::new(Shared {
                settings,
                registry,
                backend: ArcSwap::from_pointee(backend),
                current: ArcSwapOption::empty(),
                pipeline: OnceLock::new(),
            }),
        }
    }

    pub fn from_env() -> Result<Self, LogError> {
        Ok(Self::new(Settings::from_env()?))
    }

    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    /// Substitutes the backend constructor used by later `init` calls.
    pub fn set_logger<F>(&self, factory: F)
    where
        F: Fn(&BackendOptions) -> Result<Arc<dyn LogHandle>, LogError> + Send + Sync + 'static,
    {
        let factory: BackendFactory = Arc::new(factory);
        self.shared.backend.store(Arc::new(factory));
    }

    /// Builds the root handle and makes it current, replacing any previous one.
    pub fn init(&self, args: InitArgs) -> Result<Dispatcher, LogError> {
        let name = args.name.trim();
        if name.is_empty() {
            return Err(LogError::ConfigError("init requires a non-empty `name`".into()));
        }

        let options = BackendOptions {
            name: name.to_string(),
            level: self.shared.settings.min_level()?,
            pretty: args.pretty.unwrap_or(self.shared.settings.pretty),
        };

        let backend = self.shared.backend.load_full();
        let mut handle = (*backend)(&options)?;
        if let Some(base) = args.base.filter(|base| !base.is_empty()) {
            handle = handle.child(base);
        }

        self.shared.current.store(Some(Arc::new(handle.clone())));
        Ok(Dispatcher::new(handle, self.shared.clone()))
    }

    /// Derives a child of `handle` (or of the current handle) carrying `options`.
    pub fn meta(&self, options: Fields, handle: Option<Arc<dyn LogHandle>>) -> Result<Dispatcher, LogError> {
        if options.is_empty() {
            return Err(LogError::ArgumentError("meta requires a non-empty metadata record".into()));
        }

        let parent = handle
            .or_else(|| self.shared.current())
            .ok_or_else(|| LogError::ConfigError("meta called before init".into()))?;

        Ok(Dispatcher::new(parent.child(options), self.shared.clone()))
    }

    pub fn get_logger(&self) -> Option<Arc<dyn LogHandle>> {
        self.shared.current()
    }

    /// Whether the plugin pipeline has been loaded.
    pub fn is_enriched(&self) -> bool {
        self.shared.pipeline.get().is_some()
    }

    /// The loaded plugin pipeline, if any dispatch has happened yet.
    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.shared.pipeline.get()
    }
}

fn default_backend(options: &BackendOptions) -> Result<Arc<dyn LogHandle>, LogError> {
    let logger = LoggerBuilder::new(&options.name)
        .with_level(options.level)
        .with_pretty(options.pretty)
        .build()?;
    Ok(Arc::new(logger))
}

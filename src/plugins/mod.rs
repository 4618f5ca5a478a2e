// src/plugins/mod.rs

pub mod enrich;
pub mod heap;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod sentry;
pub mod system;

pub use enrich::{Enrichment, Pipeline, SideEffect};
pub use loader::{PluginLoader, SearchPath};
pub use registry::{PluginFactory, PluginRegistry};

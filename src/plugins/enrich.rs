//! Enrichment stages and their ordered composition.
//!
//! An [`Enrichment`] is a side effect bound to a set of levels. A [`Pipeline`]
//! is the combined transform: stages are appended in configured order and each
//! new stage wraps everything before it, so at dispatch time the last stage
//! runs first and the first stage runs right before the backend write.

use std::fmt;
use std::sync::Arc;

use crate::loggers::core::{Fields, LogLevel, Message};

pub type SideEffect = Arc<dyn Fn(&mut Fields, &Message) + Send + Sync>;

#[derive(Clone)]
pub struct Enrichment {
    levels: Vec<LogLevel>,
    effect: SideEffect,
}

impl Enrichment {
    /// Binds `effect` to `levels`; an empty slice targets every level.
    pub fn wrap<F>(effect: F, levels: &[LogLevel]) -> Self
    where
        F: Fn(&mut Fields, &Message) + Send + Sync + 'static,
    {
        Self {
            levels: levels.to_vec(),
            effect: Arc::new(effect),
        }
    }

    pub fn levels(&self) -> &[LogLevel] {
        &self.levels
    }

    pub fn with_levels(mut self, levels: &[LogLevel]) -> Self {
        self.levels = levels.to_vec();
        self
    }

    pub fn targets(&self, level: LogLevel) -> bool {
        self.levels.is_empty() || self.levels.contains(&level)
    }

    /// Runs the side effect regardless of level.
    pub fn invoke(&self, data: &mut Fields, msg: &Message) {
        (self.effect)(data, msg);
    }

    pub fn apply(&self, level: LogLevel, data: &mut Fields, msg: &Message) {
        if self.targets(level) {
            self.invoke(data, msg);
        }
    }
}

impl fmt::Debug for Enrichment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enrichment")
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Enrichment>,
}

impl Pipeline {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Left-to-right fold: the first enrichment is applied first and ends up innermost.
    pub fn compose(enrichments: impl IntoIterator<Item = Enrichment>) -> Self {
        enrichments
            .into_iter()
            .fold(Self::identity(), |pipeline, stage| pipeline.then(stage))
    }

    /// Wraps the current pipeline in `stage`.
    pub fn then(mut self, stage: Enrichment) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stages in configured (application) order.
    pub fn stages(&self) -> &[Enrichment] {
        &self.stages
    }

    pub fn run(&self, level: LogLevel, data: &mut Fields, msg: &Message) {
        for stage in self.stages.iter().rev() {
            stage.apply(level, data, msg);
        }
    }
}

//! Stage tracking for a wizard session.
//!
//! `WorkflowState` owns the active dataset, the latest processed result and
//! the shared error channel. It never transforms data; completion handlers
//! report into it and it decides which stage is active.

use crate::dataset::TabularDataset;
use crate::pipeline::materialize::MaterializedResult;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkflowStage {
    Ingest,
    Configure,
    Review,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Ingest => "ingest",
            WorkflowStage::Configure => "configure",
            WorkflowStage::Review => "review",
        };
        write!(f, "{name}")
    }
}

/// Monotonic tag bumped on every successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The result was built from a dataset that has since been replaced.
    Stale { current: Generation },
}

#[derive(Debug)]
pub struct WorkflowState {
    stage: WorkflowStage,
    generation: Generation,
    dataset: Option<Arc<TabularDataset>>,
    result: Option<MaterializedResult>,
    error: Option<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            stage: WorkflowStage::Ingest,
            generation: Generation::default(),
            dataset: None,
            result: None,
            error: None,
        }
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn dataset(&self) -> Option<&Arc<TabularDataset>> {
        self.dataset.as_ref()
    }

    pub fn result(&self) -> Option<&MaterializedResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Manual navigation. Nothing produced so far is discarded.
    pub fn navigate(&mut self, stage: WorkflowStage) {
        debug!(from = %self.stage, to = %stage, "Navigating");
        self.stage = stage;
    }

    /// Replace the active dataset and move to `Configure`.
    pub fn dataset_ingested(&mut self, dataset: TabularDataset) -> Generation {
        self.generation = self.generation.next();
        self.dataset = Some(Arc::new(dataset));
        self.error = None;
        self.stage = WorkflowStage::Configure;
        info!(generation = %self.generation, "Active dataset replaced");
        self.generation
    }

    /// Publish a failure. The active stage and data are left as they are.
    pub fn record_failure(&mut self, error: &dyn fmt::Display) {
        let message = error.to_string();
        warn!(stage = %self.stage, "{}", message);
        self.error = Some(message);
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// Apply a processed result if it belongs to the active dataset.
    ///
    /// The result is always stored, but only a session still in `Configure`
    /// is moved on to `Review`; a user who navigated elsewhere stays put.
    pub fn apply_result(&mut self, generation: Generation, result: MaterializedResult) -> ApplyOutcome {
        if !self.is_current(generation) {
            warn!(
                submitted = %generation,
                current = %self.generation,
                "Discarding result for a superseded dataset"
            );
            return ApplyOutcome::Stale {
                current: self.generation,
            };
        }
        self.result = Some(result);
        self.error = None;
        if self.stage == WorkflowStage::Configure {
            self.stage = WorkflowStage::Review;
        } else {
            debug!(stage = %self.stage, "Result stored without leaving the current stage");
        }
        ApplyOutcome::Applied
    }
}

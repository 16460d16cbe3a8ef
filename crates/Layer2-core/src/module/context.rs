//! ExecutionContext - per-run bundle handed to a module instance
//!
//! Owned by the pipeline for the duration of one module's execution and
//! never retained across modules.

use nestbox_foundation::ModuleConfig;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Everything a module may learn about the run it participates in.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Target task identifier, opaque to the core.
    task_id: String,

    /// Storage path of this analysis.
    analysis_path: PathBuf,

    /// Options from the module's own configuration section.
    options: Map<String, Value>,

    /// Per-analysis override section (reporting modules only).
    overrides: Option<ModuleConfig>,
}

impl ExecutionContext {
    /// New context for one module execution.
    pub fn new(task_id: impl Into<String>, analysis_path: impl Into<PathBuf>) -> Self {
        Self {
            task_id: task_id.into(),
            analysis_path: analysis_path.into(),
            options: Map::new(),
            overrides: None,
        }
    }

    /// Attach the module's resolved options.
    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    /// Attach a per-analysis override section.
    pub fn with_overrides(mut self, overrides: ModuleConfig) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Task identifier.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Analysis storage path.
    pub fn analysis_path(&self) -> &Path {
        &self.analysis_path
    }

    /// All module options.
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// One option by key.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Per-analysis override section, if the host supplied one.
    pub fn overrides(&self) -> Option<&ModuleConfig> {
        self.overrides.as_ref()
    }
}

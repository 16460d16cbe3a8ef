//! AuxiliaryPipeline - modules running alongside the sandboxed execution
//!
//! Auxiliary modules (sniffers, screenshotters) bracket the sandbox run:
//! started before it begins, stopped after it ends. The pipeline owns the
//! started instances so stop() reaches exactly what start() launched.

use super::runner::{self, Disposition};
use crate::module::{Auxiliary, ExecutionContext};
use crate::registry::{PluginFactory, PluginGroup, PluginRegistry};
use nestbox_foundation::StageConfig;
use std::path::PathBuf;
use tracing::{debug, error, warn};

/// Drives the auxiliary stage for one analysis run.
pub struct AuxiliaryPipeline {
    task_id: String,
    analysis_path: PathBuf,
    cfg: StageConfig,
    running: Vec<(String, Box<dyn Auxiliary>)>,
}

impl AuxiliaryPipeline {
    /// New pipeline; nothing runs until [`start`](Self::start).
    pub fn new(
        task_id: impl Into<String>,
        analysis_path: impl Into<PathBuf>,
        cfg: StageConfig,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            analysis_path: analysis_path.into(),
            cfg,
            running: Vec::new(),
        }
    }

    /// Start every scheduled auxiliary module. A module that fails to
    /// instantiate or start is logged and left out of the running set;
    /// the remaining modules still start.
    pub async fn start(&mut self, registry: &PluginRegistry) {
        for descriptor in runner::schedule(registry.list(PluginGroup::Auxiliary)) {
            let section =
                match runner::resolve(&self.cfg, PluginGroup::Auxiliary, descriptor.name()) {
                    Disposition::Run(section) => section,
                    Disposition::Unconfigured | Disposition::Disabled => continue,
                };

            let PluginFactory::Auxiliary(factory) = descriptor.factory() else {
                continue;
            };

            let mut module = match factory() {
                Ok(module) => module,
                Err(e) => {
                    error!(
                        "Failed to load the auxiliary module \"{}\": {}",
                        descriptor.name(),
                        e
                    );
                    continue;
                }
            };

            let ctx = ExecutionContext::new(&self.task_id, &self.analysis_path)
                .with_options(section.options);

            match module.start(&ctx).await {
                Ok(()) => {
                    debug!("Started auxiliary module: {}", descriptor.name());
                    self.running.push((descriptor.name().to_string(), module));
                }
                Err(e) => {
                    warn!(
                        "Unable to start auxiliary module \"{}\" for task {}: {}",
                        descriptor.name(),
                        self.task_id,
                        e
                    );
                }
            }
        }
    }

    /// Stop every running module, in start order. Stop failures are logged
    /// and never block the remaining modules.
    pub async fn stop(&mut self) {
        for (name, mut module) in self.running.drain(..) {
            match module.stop().await {
                Ok(()) => debug!("Stopped auxiliary module: {}", name),
                Err(e) => warn!("Unable to stop auxiliary module \"{}\": {}", name, e),
            }
        }
    }

    /// Number of currently running modules.
    pub fn running(&self) -> usize {
        self.running.len()
    }
}

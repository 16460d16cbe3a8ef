//! ProcessingPipeline - builds the fat results map
//!
//! Runs every enabled processing module in order. Each module sees the
//! output of the modules before it and contributes one keyed slice; the
//! accumulated map is the input to signature evaluation and reporting.

use super::runner::{self, Disposition};
use crate::module::{ExecutionContext, ResultsMap};
use crate::registry::{PluginFactory, PluginGroup, PluginRegistry};
use nestbox_foundation::StageConfig;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives the processing stage for one analysis run.
pub struct ProcessingPipeline<'a> {
    registry: &'a PluginRegistry,
    task_id: String,
    analysis_path: PathBuf,
    cfg: StageConfig,
    cancel: CancellationToken,
}

impl<'a> ProcessingPipeline<'a> {
    /// New pipeline over the registry's processing modules.
    pub fn new(
        registry: &'a PluginRegistry,
        task_id: impl Into<String>,
        analysis_path: impl Into<PathBuf>,
        cfg: StageConfig,
    ) -> Self {
        Self {
            registry,
            task_id: task_id.into(),
            analysis_path: analysis_path.into(),
            cfg,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a cooperative cancellation token checked between modules.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run every scheduled module and return the accumulated results map.
    /// Module failures are logged and the map keeps whatever was produced
    /// up to that point.
    pub async fn run(&self) -> ResultsMap {
        let mut results = ResultsMap::new();

        let scheduled = runner::schedule(self.registry.list(PluginGroup::Processing));
        if scheduled.is_empty() {
            info!("No processing modules loaded");
            return results;
        }

        for descriptor in scheduled {
            if self.cancel.is_cancelled() {
                warn!(
                    "Processing for task {} cancelled, returning partial results",
                    self.task_id
                );
                break;
            }

            let section =
                match runner::resolve(&self.cfg, PluginGroup::Processing, descriptor.name()) {
                    Disposition::Run(section) => section,
                    Disposition::Unconfigured | Disposition::Disabled => continue,
                };

            let PluginFactory::Processing(factory) = descriptor.factory() else {
                continue;
            };

            let mut module = match factory() {
                Ok(module) => module,
                Err(e) => {
                    error!(
                        "Failed to load the processing module \"{}\": {}",
                        descriptor.name(),
                        e
                    );
                    continue;
                }
            };

            let ctx = ExecutionContext::new(&self.task_id, &self.analysis_path)
                .with_options(section.options);

            match module.run(&ctx, &results).await {
                Ok(data) => {
                    debug!(
                        "Executed processing module \"{}\" for task {}",
                        descriptor.name(),
                        self.task_id
                    );

                    // A module only contributes when it has both a key and
                    // data; either one missing means "nothing this run".
                    let key = module.key();
                    if !key.is_empty() && !data.is_null() {
                        results.insert(key.to_string(), data);
                    }
                }
                Err(e) => {
                    runner::log_failure(
                        PluginGroup::Processing,
                        descriptor.name(),
                        &self.task_id,
                        &e,
                    );
                }
            }
        }

        results
    }
}

//! ReportingPipeline - fans the finalized results out to consumers
//!
//! Reporting modules only read the results map; their output is side
//! effects (report files, uploads). A per-analysis override config can
//! replace a module's settings for one run without touching the global
//! stage configuration.

use super::runner::{self, Disposition};
use crate::module::{ExecutionContext, ResultsMap};
use crate::registry::{PluginFactory, PluginGroup, PluginRegistry};
use nestbox_foundation::StageConfig;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives the reporting stage for one analysis run.
pub struct ReportingPipeline<'a> {
    registry: &'a PluginRegistry,
    task_id: String,
    analysis_path: PathBuf,
    cfg: StageConfig,
    overrides: Option<StageConfig>,
    cancel: CancellationToken,
}

impl<'a> ReportingPipeline<'a> {
    /// New pipeline over the registry's reporting modules.
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
            overrides: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach per-analysis override sections. A module whose name appears
    /// here receives that section through its context.
    pub fn with_overrides(mut self, overrides: StageConfig) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Attach a cooperative cancellation token checked between modules.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run every scheduled reporting module against the finalized results.
    pub async fn run(&self, results: &ResultsMap) {
        let scheduled = runner::schedule(self.registry.list(PluginGroup::Reporting));
        if scheduled.is_empty() {
            info!("No reporting modules loaded");
            return;
        }

        for descriptor in scheduled {
            if self.cancel.is_cancelled() {
                warn!(
                    "Reporting for task {} cancelled, remaining modules skipped",
                    self.task_id
                );
                break;
            }

            let section =
                match runner::resolve(&self.cfg, PluginGroup::Reporting, descriptor.name()) {
                    Disposition::Run(section) => section,
                    Disposition::Unconfigured | Disposition::Disabled => continue,
                };

            let PluginFactory::Reporting(factory) = descriptor.factory() else {
                continue;
            };

            let mut module = match factory() {
                Ok(module) => module,
                Err(e) => {
                    error!(
                        "Failed to load the reporting module \"{}\": {}",
                        descriptor.name(),
                        e
                    );
                    continue;
                }
            };

            let mut ctx = ExecutionContext::new(&self.task_id, &self.analysis_path)
                .with_options(section.options);

            if let Some(overrides) = &self.overrides {
                if let Some(section) = overrides.get(descriptor.name()) {
                    ctx = ctx.with_overrides(section.clone());
                }
            }

            match module.run(&ctx, results).await {
                Ok(()) => {
                    debug!(
                        "Executed reporting module \"{}\" for task {}",
                        descriptor.name(),
                        self.task_id
                    );
                }
                Err(e) => {
                    runner::log_failure(
                        PluginGroup::Reporting,
                        descriptor.name(),
                        &self.task_id,
                        &e,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PluginDescriptor;
    use async_trait::async_trait;
    use nestbox_foundation::{Error, ModuleConfig, Result};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Records each invocation with the module's view of its context.
    #[derive(Clone)]
    struct Recorder {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl crate::module::Reporter for Recorder {
        async fn run(&mut self, ctx: &ExecutionContext, results: &ResultsMap) -> Result<()> {
            let override_url = ctx
                .overrides()
                .and_then(|section| section.options.get("url"))
                .and_then(|value| value.as_str())
                .unwrap_or("-");
            self.log.lock().unwrap().push(format!(
                "{}:{}:{}:{}",
                self.name,
                ctx.task_id(),
                results.len(),
                override_url
            ));
            if self.fail {
                return Err(Error::reporting(self.name, "disk full"));
            }
            Ok(())
        }
    }

    fn register(
        registry: &PluginRegistry,
        name: &'static str,
        order: i32,
        fail: bool,
        log: &Arc<Mutex<Vec<String>>>,
    ) {
        let recorder = Recorder {
            name,
            fail,
            log: Arc::clone(log),
        };
        registry.register(
            PluginDescriptor::reporting(name, move || Ok(Box::new(recorder.clone())))
                .with_order(order),
        );
    }

    fn enabled_cfg(names: &[&str]) -> StageConfig {
        let mut cfg = StageConfig::new();
        for name in names {
            cfg.insert(*name, ModuleConfig::enabled());
        }
        cfg
    }

    fn sample_results() -> ResultsMap {
        let mut results = ResultsMap::new();
        results.insert("signatures".to_string(), json!([]));
        results
    }

    #[tokio::test]
    async fn test_reporters_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = PluginRegistry::new();
        register(&registry, "jsondump", 2, false, &log);
        register(&registry, "mongodb", 1, false, &log);

        let cfg = enabled_cfg(&["jsondump", "mongodb"]);
        ReportingPipeline::new(&registry, "7", "/tmp/analyses/7", cfg)
            .run(&sample_results())
            .await;

        let entries = log.lock().unwrap();
        assert_eq!(*entries, ["mongodb:7:1:-", "jsondump:7:1:-"]);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_reporters() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = PluginRegistry::new();
        register(&registry, "flaky", 1, true, &log);
        register(&registry, "jsondump", 2, false, &log);

        let cfg = enabled_cfg(&["flaky", "jsondump"]);
        ReportingPipeline::new(&registry, "7", "/tmp/analyses/7", cfg)
            .run(&sample_results())
            .await;

        let entries = log.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].starts_with("jsondump:"));
    }

    #[tokio::test]
    async fn test_overrides_reach_only_named_module() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = PluginRegistry::new();
        register(&registry, "submit", 1, false, &log);
        register(&registry, "jsondump", 2, false, &log);

        let cfg = enabled_cfg(&["submit", "jsondump"]);
        let overrides = StageConfig::new().with_section(
            "submit",
            ModuleConfig::enabled().with_option("url", json!("http://host/submit")),
        );

        ReportingPipeline::new(&registry, "7", "/tmp/analyses/7", cfg)
            .with_overrides(overrides)
            .run(&sample_results())
            .await;

        let entries = log.lock().unwrap();
        assert_eq!(entries[0], "submit:7:1:http://host/submit");
        assert_eq!(entries[1], "jsondump:7:1:-");
    }

    #[tokio::test]
    async fn test_unconfigured_reporter_is_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = PluginRegistry::new();
        register(&registry, "jsondump", 1, false, &log);

        ReportingPipeline::new(&registry, "7", "/tmp/analyses/7", StageConfig::new())
            .run(&sample_results())
            .await;

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_skips_remaining() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = PluginRegistry::new();
        register(&registry, "jsondump", 1, false, &log);

        let token = CancellationToken::new();
        token.cancel();

        let cfg = enabled_cfg(&["jsondump"]);
        ReportingPipeline::new(&registry, "7", "/tmp/analyses/7", cfg)
            .with_cancellation(token)
            .run(&sample_results())
            .await;

        assert!(log.lock().unwrap().is_empty());
    }
}

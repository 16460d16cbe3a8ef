//! Shared pipeline plumbing: scheduling, config resolution and the one
//! failure-logging policy every stage uses.

use crate::registry::{PluginDescriptor, PluginGroup};
use nestbox_foundation::{Error, ModuleConfig, StageConfig};
use tracing::{debug, error, warn};

/// What configuration resolution decided for one module.
pub(crate) enum Disposition {
    /// Configured and enabled; run it with this section.
    Run(ModuleConfig),
    /// No configuration section exists for the module.
    Unconfigured,
    /// A section exists but disables the module.
    Disabled,
}

/// Resolve a module's configuration section. An absent section means the
/// module is skipped, not that the stage fails.
pub(crate) fn resolve(cfg: &StageConfig, group: PluginGroup, name: &str) -> Disposition {
    match cfg.get(name) {
        None => {
            debug!(
                "Not loading the {} module \"{}\", no configuration section",
                group, name
            );
            Disposition::Unconfigured
        }
        Some(section) if !section.enabled => {
            debug!("The {} module \"{}\" is disabled", group, name);
            Disposition::Disabled
        }
        Some(section) => Disposition::Run(section.clone()),
    }
}

/// Order a group's descriptors for execution: enabled ones only, sorted by
/// ascending order value. The sort is stable, so modules sharing an order
/// keep their registration order.
pub(crate) fn schedule(mut descriptors: Vec<PluginDescriptor>) -> Vec<PluginDescriptor> {
    descriptors.retain(|descriptor| descriptor.is_enabled());
    descriptors.sort_by_key(|descriptor| descriptor.order());
    descriptors
}

/// Log one module failure. Declared failures are operational noise worth a
/// warning; everything else is an unexpected fault.
pub(crate) fn log_failure(group: PluginGroup, name: &str, task_id: &str, error: &Error) {
    if error.is_declared() {
        warn!(
            "The {} module \"{}\" for task {} reported: {}",
            group, name, task_id, error
        );
    } else {
        error!(
            "Failed to run the {} module \"{}\" for task {}: {}",
            group, name, task_id, error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ExecutionContext, ResultsMap};
    use async_trait::async_trait;
    use nestbox_foundation::Result;
    use serde_json::Value;

    struct NoopProcessor;

    #[async_trait]
    impl crate::module::Processor for NoopProcessor {
        fn key(&self) -> &str {
            "noop"
        }

        async fn run(&mut self, _ctx: &ExecutionContext, _results: &ResultsMap) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    fn descriptor(name: &str) -> PluginDescriptor {
        PluginDescriptor::processing(name, || Ok(Box::new(NoopProcessor)))
    }

    #[test]
    fn test_schedule_sorts_by_order() {
        let scheduled = schedule(vec![
            descriptor("last").with_order(10),
            descriptor("first").with_order(1),
            descriptor("middle").with_order(5),
        ]);

        let names: Vec<_> = scheduled.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, ["first", "middle", "last"]);
    }

    #[test]
    fn test_schedule_is_stable_for_equal_orders() {
        let scheduled = schedule(vec![
            descriptor("a").with_order(2),
            descriptor("b").with_order(2),
            descriptor("c").with_order(1),
        ]);

        let names: Vec<_> = scheduled.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_schedule_drops_disabled() {
        let scheduled = schedule(vec![
            descriptor("on"),
            descriptor("off").with_enabled(false),
        ]);

        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].name(), "on");
    }

    #[test]
    fn test_resolve_dispositions() {
        let cfg = StageConfig::new()
            .with_section("on", ModuleConfig::enabled())
            .with_section("off", ModuleConfig::disabled());

        assert!(matches!(
            resolve(&cfg, PluginGroup::Processing, "on"),
            Disposition::Run(_)
        ));
        assert!(matches!(
            resolve(&cfg, PluginGroup::Processing, "off"),
            Disposition::Disabled
        ));
        assert!(matches!(
            resolve(&cfg, PluginGroup::Processing, "unknown"),
            Disposition::Unconfigured
        ));
    }
}

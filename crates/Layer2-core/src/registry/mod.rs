//! Plugin Registry - per-group descriptor lists
//!
//! Discovery (directory scanning, filename-to-module mapping) happens
//! outside the core; whatever it finds is registered here as a
//! [`PluginDescriptor`] carrying an instantiation factory. The registry is
//! built once at startup and passed by reference into each pipeline stage,
//! so tests get clean isolation from fresh registries.

use crate::module::{Auxiliary, Machinery, Processor, Reporter};
use crate::signature::Signature;
use nestbox_foundation::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Default execution order for modules that do not declare one.
pub const DEFAULT_ORDER: i32 = 1;

// ============================================================================
// PluginGroup
// ============================================================================

/// Capability group of a plugin, each with its own lifecycle contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginGroup {
    /// Runs alongside the sandboxed execution (start/stop lifecycle).
    Auxiliary,
    /// Sandbox/virtualization drivers.
    Machinery,
    /// Results pipeline: contributes one key to the fat map.
    Processing,
    /// Results pipeline: consumes the finalized fat map.
    Reporting,
    /// Detection rules evaluated against the behavioral trace.
    Signatures,
}

impl PluginGroup {
    /// All groups, in pipeline order.
    pub const ALL: [PluginGroup; 5] = [
        PluginGroup::Auxiliary,
        PluginGroup::Machinery,
        PluginGroup::Processing,
        PluginGroup::Reporting,
        PluginGroup::Signatures,
    ];
}

impl fmt::Display for PluginGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auxiliary => write!(f, "auxiliary"),
            Self::Machinery => write!(f, "machinery"),
            Self::Processing => write!(f, "processing"),
            Self::Reporting => write!(f, "reporting"),
            Self::Signatures => write!(f, "signatures"),
        }
    }
}

// ============================================================================
// PluginFactory
// ============================================================================

/// Factory for fresh plugin instances. Plugin types are shared across runs
/// but every run instantiates its own modules, so descriptors hold a
/// factory rather than an instance.
#[derive(Clone)]
pub enum PluginFactory {
    Auxiliary(Arc<dyn Fn() -> Result<Box<dyn Auxiliary>> + Send + Sync>),
    Machinery(Arc<dyn Fn() -> Result<Box<dyn Machinery>> + Send + Sync>),
    Processing(Arc<dyn Fn() -> Result<Box<dyn Processor>> + Send + Sync>),
    Reporting(Arc<dyn Fn() -> Result<Box<dyn Reporter>> + Send + Sync>),
    Signature(Arc<dyn Fn() -> Result<Box<dyn Signature>> + Send + Sync>),
}

impl PluginFactory {
    /// Group this factory produces instances for.
    pub fn group(&self) -> PluginGroup {
        match self {
            Self::Auxiliary(_) => PluginGroup::Auxiliary,
            Self::Machinery(_) => PluginGroup::Machinery,
            Self::Processing(_) => PluginGroup::Processing,
            Self::Reporting(_) => PluginGroup::Reporting,
            Self::Signature(_) => PluginGroup::Signatures,
        }
    }
}

impl fmt::Debug for PluginFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PluginFactory({})", self.group())
    }
}

// ============================================================================
// PluginDescriptor
// ============================================================================

/// Identifies one concrete plugin implementation. Created at discovery
/// time, immutable thereafter.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    /// Canonical short name, also the module's configuration section name.
    name: String,

    /// Execution order within the group (ascending).
    order: i32,

    /// Whether discovery resolved the plugin as enabled.
    enabled: bool,

    /// Instantiation factory; also determines the group.
    factory: PluginFactory,
}

impl PluginDescriptor {
    /// Descriptor for an auxiliary module.
    pub fn auxiliary(
        name: impl Into<String>,
        factory: impl Fn() -> Result<Box<dyn Auxiliary>> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, PluginFactory::Auxiliary(Arc::new(factory)))
    }

    /// Descriptor for a machinery driver.
    pub fn machinery(
        name: impl Into<String>,
        factory: impl Fn() -> Result<Box<dyn Machinery>> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, PluginFactory::Machinery(Arc::new(factory)))
    }

    /// Descriptor for a processing module.
    pub fn processing(
        name: impl Into<String>,
        factory: impl Fn() -> Result<Box<dyn Processor>> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, PluginFactory::Processing(Arc::new(factory)))
    }

    /// Descriptor for a reporting module.
    pub fn reporting(
        name: impl Into<String>,
        factory: impl Fn() -> Result<Box<dyn Reporter>> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, PluginFactory::Reporting(Arc::new(factory)))
    }

    /// Descriptor for a signature rule.
    pub fn signature(
        name: impl Into<String>,
        factory: impl Fn() -> Result<Box<dyn Signature>> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, PluginFactory::Signature(Arc::new(factory)))
    }

    fn new(name: impl Into<String>, factory: PluginFactory) -> Self {
        Self {
            name: name.into(),
            order: DEFAULT_ORDER,
            enabled: true,
            factory,
        }
    }

    /// Set the execution order.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Set the enabled flag resolved from configuration.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Canonical short name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execution order within the group.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Whether the plugin is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Capability group.
    pub fn group(&self) -> PluginGroup {
        self.factory.group()
    }

    /// Instantiation factory.
    pub fn factory(&self) -> &PluginFactory {
        &self.factory
    }
}

// ============================================================================
// PluginRegistry
// ============================================================================

/// All known plugin descriptors, one list per group in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    groups: RwLock<HashMap<PluginGroup, Vec<PluginDescriptor>>>,
}

impl PluginRegistry {
    /// New empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor to its group's list. Duplicates are allowed;
    /// avoiding them is the discovery step's responsibility.
    pub fn register(&self, descriptor: PluginDescriptor) {
        debug!(
            "Registered {} plugin: {}",
            descriptor.group(),
            descriptor.name()
        );
        self.groups
            .write()
            .entry(descriptor.group())
            .or_default()
            .push(descriptor);
    }

    /// Descriptors of one group, in registration order.
    pub fn list(&self, group: PluginGroup) -> Vec<PluginDescriptor> {
        self.groups.read().get(&group).cloned().unwrap_or_default()
    }

    /// The full group-to-descriptors mapping.
    pub fn groups(&self) -> HashMap<PluginGroup, Vec<PluginDescriptor>> {
        self.groups.read().clone()
    }

    /// Number of descriptors in one group.
    pub fn count(&self, group: PluginGroup) -> usize {
        self.groups.read().get(&group).map_or(0, Vec::len)
    }
}

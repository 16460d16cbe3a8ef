//! Module traits - one per plugin group
//!
//! Modules are opaque to the core: each trait is a narrow contract and the
//! pipelines never assume an implementation is non-blocking.

use super::context::ExecutionContext;
use super::ResultsMap;
use async_trait::async_trait;
use nestbox_foundation::Result;
use serde_json::Value;

/// A processing module: digests raw analysis artifacts into one keyed
/// slice of the results map.
///
/// Declared failures are reported as [`Error::Processing`] or
/// [`Error::DependencyMissing`]; anything else is treated as an
/// unexpected fault. Either way the pipeline continues with the next
/// module.
///
/// [`Error::Processing`]: nestbox_foundation::Error::Processing
/// [`Error::DependencyMissing`]: nestbox_foundation::Error::DependencyMissing
#[async_trait]
pub trait Processor: Send {
    /// Key under which this module's output lands in the results map.
    fn key(&self) -> &str;

    /// Produce this module's slice of the results. Earlier modules' output
    /// is visible through `results`; returning `Value::Null` contributes
    /// nothing.
    async fn run(&mut self, ctx: &ExecutionContext, results: &ResultsMap) -> Result<Value>;
}

/// A reporting module: consumes the finalized results map for side effects
/// (file writes, uploads) that are opaque to the core.
#[async_trait]
pub trait Reporter: Send {
    /// Emit a report from the finalized results.
    async fn run(&mut self, ctx: &ExecutionContext, results: &ResultsMap) -> Result<()>;
}

/// An auxiliary module: runs alongside the sandboxed execution itself
/// (network sniffers, screenshots) rather than in the results pipeline.
#[async_trait]
pub trait Auxiliary: Send {
    /// Start the module before the sandbox run begins.
    async fn start(&mut self, ctx: &ExecutionContext) -> Result<()>;

    /// Stop the module once the sandbox run is over.
    async fn stop(&mut self) -> Result<()>;
}

/// Sandbox machinery lifecycle. The virtualization layer itself lives
/// outside this crate; the trait exists so machinery plugins share the
/// registry contract with every other group.
#[async_trait]
pub trait Machinery: Send {
    /// Verify the backing hypervisor/emulator is reachable.
    async fn initialize(&mut self) -> Result<()>;

    /// Start the machine identified by `label`.
    async fn start(&mut self, label: &str) -> Result<()>;

    /// Stop the machine identified by `label`.
    async fn stop(&mut self, label: &str) -> Result<()>;
}

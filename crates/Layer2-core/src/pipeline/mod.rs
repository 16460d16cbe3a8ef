//! Pipelines - stage drivers over the plugin registry
//!
//! Each pipeline pulls one group's descriptors out of the registry,
//! resolves configuration, instantiates fresh module instances and drives
//! them in order. A failing module never aborts its stage; failures are
//! logged with task context and the stage moves on.

mod auxiliary;
mod processing;
mod reporting;
mod runner;

pub use auxiliary::AuxiliaryPipeline;
pub use processing::ProcessingPipeline;
pub use reporting::ReportingPipeline;

//! # nestbox-core
//!
//! Core runtime for the Nestbox analysis pipeline. An analysis run flows
//! through three stages over one shared results container:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  PluginRegistry                                              │
//! │  ├── register(descriptor) - per-group descriptor lists       │
//! │  └── list(group) - registration order                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ProcessingPipeline ── results map ("fat map")               │
//! │  SignatureEngine ───── results["signatures"]                 │
//! │  ReportingPipeline ─── side effects                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  AuxiliaryPipeline - start/stop alongside the sandbox        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use nestbox_core::{PluginRegistry, ProcessingPipeline, ReportingPipeline, SignatureEngine};
//!
//! let registry = PluginRegistry::new();
//! // ... discovery registers descriptors ...
//!
//! let mut results = ProcessingPipeline::new(&registry, "42", storage, processing_cfg)
//!     .run()
//!     .await;
//! SignatureEngine::new(&registry).run(&mut results);
//! ReportingPipeline::new(&registry, "42", storage, reporting_cfg)
//!     .run(&results)
//!     .await;
//! ```

pub mod module;
pub mod pipeline;
pub mod registry;
pub mod signature;
pub mod trace;

/// Version of the running signature engine, used to gate signatures that
/// declare minimum/maximum compatible versions.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-exports: Module system
pub use module::{Auxiliary, ExecutionContext, Machinery, Processor, Reporter, ResultsMap};

// Re-exports: Pipelines
pub use pipeline::{AuxiliaryPipeline, ProcessingPipeline, ReportingPipeline};

// Re-exports: Registry
pub use registry::{PluginDescriptor, PluginFactory, PluginGroup, PluginRegistry};

// Re-exports: Signatures
pub use signature::{Detection, Signature, SignatureEngine};

// Re-exports: Trace
pub use trace::{CallRecord, ProcessRecord, Trace};

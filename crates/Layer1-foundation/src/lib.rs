//! # nestbox-foundation
//!
//! Foundation layer for Nestbox:
//! - Error: central error enum + `Result` alias shared by every pipeline stage
//! - Config: per-stage module configuration sections (already parsed by the host)
//! - Version: engine version parsing and comparison for signature gating

pub mod config;
pub mod error;
pub mod version;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{ModuleConfig, StageConfig};

// ============================================================================
// Version
// ============================================================================
pub use version::EngineVersion;

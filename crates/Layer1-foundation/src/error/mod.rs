//! Error types for Nestbox
//!
//! Every pipeline stage reports failures through this enum. The module
//! runner and the signature engine classify variants to decide the log
//! level; no variant ever aborts an analysis run.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Nestbox error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Plugin lifecycle
    // ========================================================================
    #[error("Failed to load plugin \"{0}\"")]
    PluginLoad(String),

    #[error("Module \"{module}\" has missing dependencies: {message}")]
    DependencyMissing { module: String, message: String },

    // ========================================================================
    // Module execution (declared, module-owned failures)
    // ========================================================================
    #[error("Processing module \"{module}\" error: {message}")]
    Processing { module: String, message: String },

    #[error("Reporting module \"{module}\" error: {message}")]
    Reporting { module: String, message: String },

    #[error("Auxiliary module \"{module}\" error: {message}")]
    Auxiliary { module: String, message: String },

    // ========================================================================
    // Signatures
    // ========================================================================
    #[error("Invalid version string: {0}")]
    Version(String),

    #[error("Signature \"{signature}\" error: {message}")]
    Signature { signature: String, message: String },

    // ========================================================================
    // General
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // External conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Fallback
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// A failure the module declared about itself. The pipelines log these
    /// at warning level and move on; anything else is an unexpected fault
    /// and logged at error level.
    pub fn is_declared(&self) -> bool {
        matches!(
            self,
            Error::DependencyMissing { .. }
                | Error::Processing { .. }
                | Error::Reporting { .. }
                | Error::Auxiliary { .. }
        )
    }

    /// Missing-dependency error helper
    pub fn dependency(module: impl Into<String>, message: impl Into<String>) -> Self {
        Error::DependencyMissing {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Processing error helper
    pub fn processing(module: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Processing {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Reporting error helper
    pub fn reporting(module: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Reporting {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Auxiliary error helper
    pub fn auxiliary(module: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Auxiliary {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Signature error helper
    pub fn signature(signature: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Signature {
            signature: signature.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From implementations (additional conversions)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_failures() {
        assert!(Error::dependency("dropped", "yara not installed").is_declared());
        assert!(Error::processing("static", "corrupt PE header").is_declared());
        assert!(Error::reporting("jsondump", "disk full").is_declared());
        assert!(!Error::PluginLoad("static".into()).is_declared());
        assert!(!Error::Internal("boom".into()).is_declared());
    }

    #[test]
    fn test_display_includes_module_name() {
        let err = Error::processing("static", "corrupt PE header");
        let text = err.to_string();
        assert!(text.contains("static"));
        assert!(text.contains("corrupt PE header"));
    }
}

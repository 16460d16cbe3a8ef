//! Module configuration types
//!
//! Config-file parsing belongs to the host; the pipelines only consume
//! already-parsed sections. Each stage (auxiliary, processing, reporting)
//! receives one [`StageConfig`] whose sections are keyed by module name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One module's configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Whether the module may run at all.
    #[serde(default)]
    pub enabled: bool,

    /// Free-form module options, handed to the instance verbatim.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ModuleConfig {
    /// An enabled section with no options.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            options: Map::new(),
        }
    }

    /// A disabled section.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Add an option value.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// All configuration sections for one pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(flatten)]
    sections: HashMap<String, ModuleConfig>,
}

impl StageConfig {
    /// Empty stage configuration: every module is unconfigured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module section.
    pub fn with_section(mut self, name: impl Into<String>, config: ModuleConfig) -> Self {
        self.sections.insert(name.into(), config);
        self
    }

    /// Insert or replace a module section.
    pub fn insert(&mut self, name: impl Into<String>, config: ModuleConfig) {
        self.sections.insert(name.into(), config);
    }

    /// Look up a module's section by its canonical short name.
    pub fn get(&self, name: &str) -> Option<&ModuleConfig> {
        self.sections.get(name)
    }

    /// Number of configured sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether no section is configured.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_lookup() {
        let cfg = StageConfig::new()
            .with_section("static", ModuleConfig::enabled())
            .with_section("dropped", ModuleConfig::disabled());

        assert!(cfg.get("static").map(|s| s.enabled).unwrap_or(false));
        assert!(!cfg.get("dropped").map(|s| s.enabled).unwrap_or(true));
        assert!(cfg.get("memory").is_none());
        assert_eq!(cfg.len(), 2);
    }

    #[test]
    fn test_options_passthrough() {
        let section = ModuleConfig::enabled()
            .with_option("scan_timeout", json!(120))
            .with_option("deep_scan", json!(true));

        assert_eq!(section.options.get("scan_timeout"), Some(&json!(120)));
        assert_eq!(section.options.get("deep_scan"), Some(&json!(true)));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let cfg: StageConfig = toml::from_str(
            r#"
            [static]
            enabled = true
            scan_timeout = 120

            [dropped]
            enabled = false
            "#,
        )
        .unwrap();

        let section = cfg.get("static").unwrap();
        assert!(section.enabled);
        assert_eq!(section.options.get("scan_timeout"), Some(&serde_json::json!(120)));
        assert!(!cfg.get("dropped").unwrap().enabled);
    }

    #[test]
    fn test_enabled_defaults_to_false() {
        let cfg: StageConfig = toml::from_str("[memory]\n").unwrap();
        assert!(!cfg.get("memory").unwrap().enabled);
    }
}

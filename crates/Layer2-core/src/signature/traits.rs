//! Signature trait and detection type
//!
//! Every hook is present on the trait with a no-op default, so the dispatch
//! loop never has to ask whether a rule implements a handler. A signature
//! instance is bound to a single engine run and never reused.

use crate::trace::{CallRecord, ProcessRecord};
use nestbox_foundation::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The externally visible form of one matched signature. Also the payload
/// handed to peers' [`Signature::on_signature`] during a cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub name: String,
    pub severity: u16,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Signature-specific payload accumulated while matching.
    #[serde(flatten)]
    pub marks: Map<String, Value>,
}

/// A behavioral detection rule.
///
/// Metadata methods describe the rule; hook methods receive the replayed
/// trace. Hooks returning `Ok(true)` report a match; errors are contained
/// at the dispatch boundary and count as no match.
pub trait Signature: Send {
    // ========================================================================
    // Metadata
    // ========================================================================

    /// Stable rule name.
    fn name(&self) -> &str;

    /// Human-readable description, shown in the emitted detection.
    fn description(&self) -> &str {
        ""
    }

    /// Severity ordinal; detections are sorted ascending by this.
    fn severity(&self) -> u16 {
        1
    }

    /// Minimum compatible engine version (dotted numeric), if any.
    fn minimum(&self) -> Option<&str> {
        None
    }

    /// Maximum compatible engine version (dotted numeric), if any.
    fn maximum(&self) -> Option<&str> {
        None
    }

    // ========================================================================
    // Filters - empty list means unfiltered
    // ========================================================================

    /// Process names this rule wants calls from.
    fn filter_process_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// API names this rule wants calls for.
    fn filter_api_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Call categories this rule wants calls for.
    fn filter_categories(&self) -> Vec<String> {
        Vec::new()
    }

    // ========================================================================
    // Lifecycle hooks
    // ========================================================================

    /// One-time setup before the trace is replayed.
    fn init(&mut self) {}

    /// Early exit: returning true removes the rule before replay begins,
    /// so it never sees events.
    fn quickout(&self) -> bool {
        false
    }

    /// Rule-specific enable state, consulted before every dispatch.
    fn is_active(&self) -> bool {
        true
    }

    // ========================================================================
    // Event hooks
    // ========================================================================

    /// A new process appears in the trace.
    fn on_process(&mut self, _process: &ProcessRecord) -> Result<bool> {
        Ok(false)
    }

    /// A call passed all of this rule's filters. `index` is the call's
    /// position within its process.
    fn on_call(
        &mut self,
        _call: &CallRecord,
        _process: &ProcessRecord,
        _index: usize,
    ) -> Result<bool> {
        Ok(false)
    }

    /// Another signature (possibly this one) just matched.
    fn on_signature(&mut self, _matched: &Detection) -> Result<bool> {
        Ok(false)
    }

    /// The full trace has been replayed.
    fn on_complete(&mut self) -> Result<bool> {
        Ok(false)
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Extra key/value payload merged into the emitted detection.
    fn details(&self) -> Map<String, Value> {
        Map::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Bare;

    impl Signature for Bare {
        fn name(&self) -> &str {
            "bare"
        }
    }

    #[test]
    fn test_defaults() {
        let mut sig = Bare;
        assert_eq!(sig.severity(), 1);
        assert!(sig.minimum().is_none());
        assert!(sig.filter_api_names().is_empty());
        assert!(!sig.quickout());
        assert!(sig.is_active());
        assert!(!sig.on_complete().unwrap());
    }

    #[test]
    fn test_detection_serialization() {
        let mut marks = Map::new();
        marks.insert("registry_key".to_string(), json!("HKCU\\Run"));

        let detection = Detection {
            name: "persistence_autorun".to_string(),
            severity: 3,
            description: String::new(),
            marks,
        };

        let value = serde_json::to_value(&detection).unwrap();
        assert_eq!(value["name"], json!("persistence_autorun"));
        assert_eq!(value["severity"], json!(3));
        assert_eq!(value["registry_key"], json!("HKCU\\Run"));
        // Empty description stays out of the payload.
        assert!(value.get("description").is_none());
    }
}

//! Behavioral trace model
//!
//! The trace is produced by the sandbox layer and lands in the results map
//! under `"behavior"` → `"processes"`. It is read-only during signature
//! evaluation.

use crate::module::ResultsMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// One recorded API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// API name, e.g. "CreateFileW".
    pub api: String,

    /// Call category, e.g. "filesystem" or "registry".
    pub category: String,

    /// Remaining call payload (arguments, return value, timestamps),
    /// consumed by rule handlers.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// One monitored process and its ordered calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub process_name: String,
    #[serde(default)]
    pub calls: Vec<CallRecord>,
}

/// The full behavioral record of one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub processes: Vec<ProcessRecord>,
}

impl Trace {
    /// Pull the trace out of the results map. A missing `"behavior"` key or
    /// missing `"processes"` means "no processes to replay", not an error;
    /// a malformed section is logged and likewise yields an empty trace.
    pub fn from_results(results: &ResultsMap) -> Trace {
        let Some(behavior) = results.get("behavior") else {
            return Trace::default();
        };

        match serde_json::from_value(behavior.clone()) {
            Ok(trace) => trace,
            Err(e) => {
                warn!("Malformed behavior section in results: {}", e);
                Trace::default()
            }
        }
    }

    /// Whether the trace holds no processes at all.
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

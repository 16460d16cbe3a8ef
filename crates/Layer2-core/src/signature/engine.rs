//! SignatureEngine - trace replay and match correlation
//!
//! One engine run loads enabled, version-compatible signatures, replays the
//! behavioral trace against them and stores the severity-sorted detections
//! under `results["signatures"]`. Every dispatch goes through one match
//! wrapper; a match queues `on_signature` notifications to every active
//! signature, and those notifications run through the same wrapper so
//! cascades can chain (bounded by [`MAX_CASCADE_DEPTH`]).

use super::traits::{Detection, Signature};
use crate::module::ResultsMap;
use crate::registry::{PluginFactory, PluginGroup, PluginRegistry};
use crate::trace::{CallRecord, ProcessRecord, Trace};
use nestbox_foundation::EngineVersion;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Bound on chained `on_signature` cascades per originating match. Within
/// the bound every match still notifies every active signature; beyond it
/// the notification is dropped with a warning.
pub const MAX_CASCADE_DEPTH: usize = 16;

// ============================================================================
// ActiveSignature - one instantiated rule bound to this run
// ============================================================================

struct ActiveSignature {
    signature: Box<dyn Signature>,
    name: String,
    severity: u16,

    // Filter lists compiled into sets once; membership tests dominate the
    // replay hot path.
    filter_process_names: HashSet<String>,
    filter_api_names: HashSet<String>,
    filter_categories: HashSet<String>,

    matched: bool,
    matched_seq: Option<usize>,
}

impl ActiveSignature {
    fn new(signature: Box<dyn Signature>) -> Self {
        let name = signature.name().to_string();
        let severity = signature.severity();
        let filter_process_names = signature.filter_process_names().into_iter().collect();
        let filter_api_names = signature.filter_api_names().into_iter().collect();
        let filter_categories = signature.filter_categories().into_iter().collect();

        Self {
            signature,
            name,
            severity,
            filter_process_names,
            filter_api_names,
            filter_categories,
            matched: false,
            matched_seq: None,
        }
    }

    /// A call reaches the rule only if it passes every non-empty filter.
    fn admits(&self, process: &ProcessRecord, call: &CallRecord) -> bool {
        if !self.filter_process_names.is_empty()
            && !self.filter_process_names.contains(&process.process_name)
        {
            return false;
        }

        if !self.filter_api_names.is_empty() && !self.filter_api_names.contains(&call.api) {
            return false;
        }

        if !self.filter_categories.is_empty() && !self.filter_categories.contains(&call.category) {
            return false;
        }

        true
    }

    fn detection(&self) -> Detection {
        Detection {
            name: self.name.clone(),
            severity: self.severity,
            description: self.signature.description().to_string(),
            marks: self.signature.details(),
        }
    }
}

// ============================================================================
// Event - one dispatch into a signature hook
// ============================================================================

enum Event<'t> {
    Process(&'t ProcessRecord),
    Call(&'t CallRecord, &'t ProcessRecord, usize),
    Signature(Detection),
    Complete,
}

impl Event<'_> {
    fn handler_name(&self) -> &'static str {
        match self {
            Event::Process(_) => "on_process",
            Event::Call(..) => "on_call",
            Event::Signature(_) => "on_signature",
            Event::Complete => "on_complete",
        }
    }
}

// ============================================================================
// SignatureEngine
// ============================================================================

/// The correlation engine for one analysis run.
pub struct SignatureEngine<'a> {
    registry: &'a PluginRegistry,
    version: EngineVersion,
    cancel: CancellationToken,
}

impl<'a> SignatureEngine<'a> {
    /// New engine bound to the running crate version.
    pub fn new(registry: &'a PluginRegistry) -> Self {
        Self {
            registry,
            version: crate::ENGINE_VERSION.parse().unwrap_or_default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the engine version used for signature gating.
    pub fn with_version(mut self, version: EngineVersion) -> Self {
        self.version = version;
        self
    }

    /// Attach a cooperative cancellation token checked during replay.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Engine version used for gating.
    pub fn version(&self) -> &EngineVersion {
        &self.version
    }

    /// Replay the trace in `results` against all loaded signatures and
    /// store the matched detections under `results["signatures"]`.
    pub fn run(&self, results: &mut ResultsMap) {
        let trace = Trace::from_results(results);

        // Let signatures initialize and take an early exit. Iterate a
        // snapshot of the loaded list: quickout removal must not skip or
        // double-visit peers.
        let mut signatures = Vec::new();
        for mut active in self.load() {
            active.signature.init();

            if active.signature.quickout() {
                debug!("Signature {} opted out early", active.name);
                continue;
            }

            signatures.push(active);
        }

        debug!("Running {} signatures", signatures.len());
        for (idx, active) in signatures.iter().enumerate() {
            if idx + 1 == signatures.len() {
                debug!("\t `-- {}", active.name);
            } else {
                debug!("\t |-- {}", active.name);
            }
        }

        let mut match_seq = 0usize;
        let mut cancelled = false;

        // Iterate calls and tell interested signatures about them.
        'replay: for process in &trace.processes {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break 'replay;
            }

            for idx in 0..signatures.len() {
                self.dispatch(&mut signatures, idx, Event::Process(process), &mut match_seq);
            }

            for (index, call) in process.calls.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    break 'replay;
                }

                for idx in 0..signatures.len() {
                    if !signatures[idx].admits(process, call) {
                        continue;
                    }

                    self.dispatch(
                        &mut signatures,
                        idx,
                        Event::Call(call, process, index),
                        &mut match_seq,
                    );
                }
            }
        }

        if cancelled {
            warn!("Signature replay cancelled, emitting matches recorded so far");
        } else {
            // Yield completion events to each signature.
            for idx in 0..signatures.len() {
                self.dispatch(&mut signatures, idx, Event::Complete, &mut match_seq);
            }
        }

        // Collect in first-matched order, then a stable severity sort so
        // ties keep that order.
        let mut matched: Vec<&ActiveSignature> =
            signatures.iter().filter(|active| active.matched).collect();
        matched.sort_by_key(|active| active.matched_seq.unwrap_or(usize::MAX));

        for active in &matched {
            debug!("Analysis matched signature: {}", active.name);
        }

        let mut detections: Vec<Detection> =
            matched.iter().map(|active| active.detection()).collect();
        detections.sort_by_key(|detection| detection.severity);

        let value = serde_json::to_value(&detections).unwrap_or_else(|e| {
            error!("Failed to serialize detections: {}", e);
            Value::Array(Vec::new())
        });
        results.insert("signatures".to_string(), value);
    }

    /// Instantiate enabled, version-compatible signatures.
    fn load(&self) -> Vec<ActiveSignature> {
        let mut loaded = Vec::new();

        for descriptor in self.registry.list(PluginGroup::Signatures) {
            if !descriptor.is_enabled() {
                continue;
            }

            let PluginFactory::Signature(factory) = descriptor.factory() else {
                continue;
            };

            let signature = match factory() {
                Ok(signature) => signature,
                Err(e) => {
                    error!("Failed to load the signature \"{}\": {}", descriptor.name(), e);
                    continue;
                }
            };

            if !self.version_compatible(signature.as_ref()) {
                continue;
            }

            loaded.push(ActiveSignature::new(signature));
        }

        loaded
    }

    /// Check the declared version bounds against the running engine.
    fn version_compatible(&self, signature: &dyn Signature) -> bool {
        if let Some(minimum) = signature.minimum() {
            match minimum.parse::<EngineVersion>() {
                Ok(min) if self.version < min => {
                    debug!(
                        "Signature \"{}\" requires minimum engine version {}, running {}",
                        signature.name(),
                        minimum,
                        self.version
                    );
                    return false;
                }
                Ok(_) => {}
                Err(_) => {
                    debug!(
                        "Invalid minimum version \"{}\" in signature {}",
                        minimum,
                        signature.name()
                    );
                    return false;
                }
            }
        }

        if let Some(maximum) = signature.maximum() {
            match maximum.parse::<EngineVersion>() {
                Ok(max) if self.version > max => {
                    debug!(
                        "Signature \"{}\" requires maximum engine version {}, running {}",
                        signature.name(),
                        maximum,
                        self.version
                    );
                    return false;
                }
                Ok(_) => {}
                Err(_) => {
                    debug!(
                        "Invalid maximum version \"{}\" in signature {}",
                        maximum,
                        signature.name()
                    );
                    return false;
                }
            }
        }

        true
    }

    /// The match wrapper: every hook invocation, for every event kind, goes
    /// through here. Handler errors are contained as "no match"; a match
    /// marks the signature and queues a notification to every active
    /// signature, which re-enters this same path.
    fn dispatch(
        &self,
        signatures: &mut [ActiveSignature],
        idx: usize,
        event: Event<'_>,
        match_seq: &mut usize,
    ) {
        let mut queue: VecDeque<(usize, Event<'_>, usize)> = VecDeque::new();
        queue.push_back((idx, event, 0));

        while let Some((idx, event, depth)) = queue.pop_front() {
            if !signatures[idx].signature.is_active() {
                continue;
            }

            let outcome = {
                let active = &mut signatures[idx];
                match &event {
                    Event::Process(process) => active.signature.on_process(process),
                    Event::Call(call, process, index) => {
                        active.signature.on_call(call, process, *index)
                    }
                    Event::Signature(matched) => active.signature.on_signature(matched),
                    Event::Complete => active.signature.on_complete(),
                }
            };

            let hit = match outcome {
                Ok(hit) => hit,
                Err(e) => {
                    warn!(
                        "Failed to run '{}' of the {} signature: {}",
                        event.handler_name(),
                        signatures[idx].name,
                        e
                    );
                    false
                }
            };

            if !hit {
                continue;
            }

            let active = &mut signatures[idx];
            active.matched = true;
            if active.matched_seq.is_none() {
                active.matched_seq = Some(*match_seq);
                *match_seq += 1;
            }

            if depth >= MAX_CASCADE_DEPTH {
                warn!(
                    "Signature cascade from {} exceeded depth {}, dropping notifications",
                    signatures[idx].name, MAX_CASCADE_DEPTH
                );
                continue;
            }

            // Notify every active signature, the matched one included.
            let snapshot = signatures[idx].detection();
            for target in 0..signatures.len() {
                queue.push_back((target, Event::Signature(snapshot.clone()), depth + 1));
            }
        }
    }
}

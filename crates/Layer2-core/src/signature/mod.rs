//! Signature engine - behavioral detection rules
//!
//! Signatures are pluggable rules replayed against the behavioral trace.
//! A matched signature becomes a severity-ranked [`Detection`] under the
//! `"signatures"` key of the results map, and every match is cascaded to
//! all active signatures so meta-rules can correlate across peers.

mod engine;
mod traits;

pub use engine::{SignatureEngine, MAX_CASCADE_DEPTH};
pub use traits::{Detection, Signature};

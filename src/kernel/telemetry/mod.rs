//! Kernel telemetry.
//!
//! Read-only side channel: nothing in arbitration or scheduling may read it.
//! Events carry ids, ticks and counts only, never closures or target payloads.

pub mod event;
pub mod metrics;
pub mod recorder;

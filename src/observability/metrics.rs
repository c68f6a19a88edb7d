//! Metrics collection.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): dispatches by method, outcome
//! - `router_dispatch_duration_seconds` (histogram): match + handler latency
//!
//! # Design Decisions
//! - Outcome is `ok`, `resolved`, or an error kind, keeping label cardinality fixed
//! - Unknown verbs are recorded as `UNKNOWN`

use std::time::Duration;

pub fn record_dispatch(method: &'static str, outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!("router_dispatch_total", "method" => method, "outcome" => outcome).increment(1);
    ::metrics::histogram!("router_dispatch_duration_seconds", "method" => method)
        .record(elapsed.as_secs_f64());
}

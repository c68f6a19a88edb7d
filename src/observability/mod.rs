//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Build phase and dispatcher produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (dispatch counters and latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout, compact or JSON lines)
//!     → Whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics go through the `metrics` facade; without an installed
//!   recorder every update is a no-op

pub mod logging;
pub mod metrics;

pub use logging::init_logging;

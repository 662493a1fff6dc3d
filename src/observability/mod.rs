//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router, transitions, route tree produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → fmt subscriber installed by the binary (stdout)
//!     → any metrics recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - Library code only emits; installing subscribers/recorders is the host's job
//! - Transition id flows through every log line of a transition
//! - Metrics are cheap no-ops when no recorder is installed

pub mod logging;
pub mod metrics;

//! Metrics collection.
//!
//! # Metrics
//! - `nav_transitions_started_total` (counter)
//! - `nav_transitions_completed_total` (counter)
//! - `nav_transitions_failed_total` (counter): by reason
//! - `nav_transitions_queued_total` (counter)
//! - `nav_queue_depth` (gauge): pending requests, updated on enqueue and dequeue
//! - `nav_operations_total` (counter): by operation kind
//! - `nav_transition_duration_seconds` (histogram): start to commit
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; no exporter is bundled
//! - Labels are static strings (error kind, operation kind)

use std::time::Duration;

use metrics::{counter, gauge, histogram};

pub fn record_transition_started() {
    counter!("nav_transitions_started_total").increment(1);
}

pub fn record_transition_completed(elapsed: Duration) {
    counter!("nav_transitions_completed_total").increment(1);
    histogram!("nav_transition_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_transition_failed(reason: &'static str) {
    counter!("nav_transitions_failed_total", "reason" => reason).increment(1);
}

pub fn record_transition_queued(depth: usize) {
    counter!("nav_transitions_queued_total").increment(1);
    record_queue_depth(depth);
}

pub fn record_queue_depth(depth: usize) {
    gauge!("nav_queue_depth").set(depth as f64);
}

pub fn record_operation(kind: &'static str) {
    counter!("nav_operations_total", "kind" => kind).increment(1);
}

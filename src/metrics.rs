//! Metrics instrumentation for autoscale-dns.
//!
//! All metrics are prefixed with `autoscale_dns.`

use metrics::{counter, histogram};
use std::time::Instant;

/// Record the outcome of handling one notification.
pub fn record_notification(kind: &str, result: NotificationResult) {
    let result_str = match result {
        NotificationResult::Reconciled => "reconciled",
        NotificationResult::Failed => "failed",
    };

    counter!("autoscale_dns.notification.count", "kind" => kind.to_string(), "result" => result_str)
        .increment(1);
}

/// Outcome of one notification for metrics.
#[derive(Debug, Clone, Copy)]
pub enum NotificationResult {
    /// Pipeline ran to completion.
    Reconciled,
    /// Pipeline aborted with an error.
    Failed,
}

/// Record submitted changes by action.
pub fn record_changes(upserts: usize, deletes: usize) {
    counter!("autoscale_dns.change.count", "action" => "upsert").increment(upserts as u64);
    counter!("autoscale_dns.change.count", "action" => "delete").increment(deletes as u64);
}

/// Record how many instances survived filtering and resolved an address.
pub fn record_instances_resolved(count: usize) {
    histogram!("autoscale_dns.instances.resolved").record(count as f64);
}

/// Record the wall time of one full pipeline run.
pub fn record_reconcile_duration(duration: std::time::Duration) {
    histogram!("autoscale_dns.reconcile.duration.seconds").record(duration.as_secs_f64());
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

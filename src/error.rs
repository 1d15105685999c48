//! Error types for autoscale-dns.

use thiserror::Error;

/// Errors that can abort a single reconciliation.
///
/// Every variant aborts the remaining pipeline stages for the notification
/// that raised it; sibling notifications in the same event are unaffected.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The event payload did not match any known envelope.
    #[error("unrecognized event envelope: {0}")]
    Event(String),

    /// The fleet directory reported no group with the requested name.
    #[error("unable to find autoscaling group {0:?}")]
    GroupNotFound(String),

    /// A required tag is absent (or empty) on the group.
    #[error("group does not define a {0:?} tag")]
    MissingRequiredTag(&'static str),

    /// The group has no in-service members and the policy forbids that.
    #[error("no in-service instances were found")]
    NoInServiceInstances,

    /// The fleet directory call failed.
    #[error("fleet directory error: {0}")]
    Directory(String),

    /// The existing-record lookup on the DNS store failed.
    #[error("DNS record lookup failed: {0}")]
    DnsLookup(String),

    /// Submitting the change batch to the DNS store failed.
    #[error("DNS change submission failed: {0}")]
    DnsWrite(String),
}

//! Configuration types for autoscale-dns.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Reconciler configuration.
    pub reconciler: ReconcilerConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Reconciler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Region assumed for notifications whose envelope does not carry one
    /// (queue-delivered notifications).
    pub default_region: String,

    /// TTL for upserted DNS records in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: i64,

    /// Behavior switches for the reconciliation pipeline.
    #[serde(default)]
    pub policy: ReconcilePolicy,
}

/// Behavior switches for one reconciliation pipeline.
///
/// A single pipeline parametrized by this value replaces the strict
/// (abort on empty membership, upsert-only) and permissive (terminate-to-zero
/// deletes stale records) deployment flavors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilePolicy {
    /// Treat a group with zero in-service members as a valid "all removed"
    /// state instead of aborting.
    #[serde(default = "default_true")]
    pub allow_empty_membership: bool,

    /// Look up and delete canonical records that no longer have any
    /// contributing instance.
    #[serde(default = "default_true")]
    pub detect_deletions: bool,

    /// Pin the region instead of taking it from the notification.
    #[serde(default)]
    pub region_override: Option<String>,

    /// Pin the DNS domain suffix instead of reading the group's domain tag.
    #[serde(default)]
    pub domain_override: Option<String>,

    /// Pin the hosted-zone ID instead of reading the group's zone-id tag.
    #[serde(default)]
    pub zone_id_override: Option<String>,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            allow_empty_membership: true,
            detect_deletions: true,
            region_override: None,
            domain_override: None,
            zone_id_override: None,
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "debug", "autoscale_dns=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus metrics exporter address.
    #[serde(default)]
    pub prometheus_addr: Option<SocketAddr>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prometheus_addr: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ttl() -> i64 {
    300
}

fn default_true() -> bool {
    true
}

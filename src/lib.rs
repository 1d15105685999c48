//! Autoscale DNS - reconciles role-based DNS records against autoscaling
//! group membership.
//!
//! This crate reacts to autoscaling lifecycle notifications (instance
//! launch/terminate) and converges A records in a managed zone so that a
//! group's "role" name always resolves to the current set of in-service
//! instance addresses, region-wide and per availability zone. It is
//! stateless: every invocation reads membership, tags, and existing records
//! fresh from the fleet directory and the DNS store.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         autoscale-dns                          │
//! │                                                                │
//! │  notification ──▶ normalize ──▶ resolve group ──▶ extract tags │
//! │   (queue or           │              │                 │       │
//! │    event bus)         ▼              ▼                 ▼       │
//! │                filter in-service ──▶ resolve addresses         │
//! │                                          │                     │
//! │                                          ▼                     │
//! │                 build mapping ──▶ plan changes ──▶ submit      │
//! │                 (role.region /    (upserts +       (one atomic │
//! │                  role.zone keys)   stale deletes)   batch)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Record names
//!
//! ```text
//! web.eu-west-1.i.example.com    → every in-service instance in the group
//! web.eu-west-1a.i.example.com   → in-service instances placed in eu-west-1a
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use autoscale_dns::{AwsFleetDirectory, Reconciler, ReconcilerConfig, Route53Store};
//!
//! #[tokio::main]
//! async fn main() {
//!     let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
//!     let config = ReconcilerConfig {
//!         default_region: "eu-west-1".to_string(),
//!         ttl: 300,
//!         policy: Default::default(),
//!     };
//!
//!     let notifications = autoscale_dns::event::normalize(raw_event, &config.default_region)?;
//!     for notification in &notifications {
//!         let directory = AwsFleetDirectory::new(&sdk_config, &notification.region);
//!         let dns = Route53Store::new(&sdk_config);
//!         Reconciler::new(directory, dns, config.clone())
//!             .handle(notification)
//!             .await?;
//!     }
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod directory;
pub mod dns;
pub mod error;
pub mod event;
pub mod mapping;
pub mod metrics;
pub mod reconcile;
pub mod role;
pub mod telemetry;

// Re-export main types
pub use config::{Config, ReconcilePolicy, ReconcilerConfig, TelemetryConfig};
pub use directory::{AwsFleetDirectory, FleetDirectory};
pub use dns::{DnsStore, Route53Store};
pub use error::ReconcileError;
pub use reconcile::{ReconcileOutcome, Reconciler};

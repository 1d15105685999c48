//! Event normalization for autoscaling lifecycle notifications.
//!
//! Notifications arrive in one of two transport envelopes:
//!
//! - a queue envelope (`Records[].Sns.Message`) whose inner message is a
//!   JSON document with `Event` and `AutoScalingGroupName` fields. One
//!   envelope may batch several notifications.
//! - an event-bus envelope with a top-level `detail-type`, `region`, and
//!   `detail.AutoScalingGroupName`, plus the affected availability zone
//!   under `detail.Details`.
//!
//! Normalization is lenient at the record level: an unsupported event kind
//! or an unparsable record is logged and skipped without affecting the
//! other records in the same envelope.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ReconcileError;

/// Queue-envelope event kind for an instance launch.
const QUEUE_LAUNCH: &str = "autoscaling:EC2_INSTANCE_LAUNCH";
/// Queue-envelope event kind for an instance terminate.
const QUEUE_TERMINATE: &str = "autoscaling:EC2_INSTANCE_TERMINATE";
/// Event-bus detail-type for an instance launch.
const BUS_LAUNCH: &str = "EC2 Instance Launch Successful";
/// Event-bus detail-type for an instance terminate.
const BUS_TERMINATE: &str = "EC2 Instance Terminate Successful";

/// Kind of lifecycle event being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An instance joined the group.
    InstanceLaunch,
    /// An instance left the group.
    InstanceTerminate,
}

impl EventKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::InstanceLaunch => "instance-launch",
            EventKind::InstanceTerminate => "instance-terminate",
        }
    }
}

/// One normalized lifecycle notification, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct Notification {
    /// What happened.
    pub kind: EventKind,
    /// Name of the affected scaling group.
    pub group_name: String,
    /// Region the group lives in.
    pub region: String,
    /// Availability zone of the affected instance, when the envelope
    /// carries one. Used to scope deletion detection.
    pub availability_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueueEnvelope {
    #[serde(rename = "Records")]
    records: Vec<QueueRecord>,
}

#[derive(Debug, Deserialize)]
struct QueueRecord {
    #[serde(rename = "Sns")]
    sns: QueueBody,
}

#[derive(Debug, Deserialize)]
struct QueueBody {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ScalingMessage {
    #[serde(rename = "Event")]
    event: String,
    #[serde(rename = "AutoScalingGroupName")]
    group_name: String,
}

#[derive(Debug, Deserialize)]
struct BusEnvelope {
    #[serde(rename = "detail-type")]
    detail_type: String,
    region: String,
    detail: BusDetail,
}

#[derive(Debug, Deserialize)]
struct BusDetail {
    #[serde(rename = "AutoScalingGroupName")]
    group_name: String,
    #[serde(rename = "Details", default)]
    details: Option<BusDetails>,
}

#[derive(Debug, Deserialize)]
struct BusDetails {
    #[serde(rename = "Availability Zone", default)]
    availability_zone: Option<String>,
}

/// Normalize a raw event document into zero or more notifications.
///
/// `default_region` is attached to notifications from envelopes that do not
/// carry a region of their own. Fails only when the document is not valid
/// JSON or matches no known envelope; per-record problems are skipped.
pub fn normalize(raw: &str, default_region: &str) -> Result<Vec<Notification>, ReconcileError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ReconcileError::Event(e.to_string()))?;

    if value.get("Records").is_some() {
        let envelope: QueueEnvelope =
            serde_json::from_value(value).map_err(|e| ReconcileError::Event(e.to_string()))?;
        Ok(normalize_queue(envelope, default_region))
    } else if value.get("detail-type").is_some() {
        let envelope: BusEnvelope =
            serde_json::from_value(value).map_err(|e| ReconcileError::Event(e.to_string()))?;
        Ok(normalize_bus(envelope).into_iter().collect())
    } else {
        Err(ReconcileError::Event(
            "expected a queue envelope (Records) or an event-bus envelope (detail-type)"
                .to_string(),
        ))
    }
}

fn normalize_queue(envelope: QueueEnvelope, default_region: &str) -> Vec<Notification> {
    let mut notifications = Vec::with_capacity(envelope.records.len());

    for record in envelope.records {
        let message: ScalingMessage = match serde_json::from_str(&record.sns.message) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "skipping unparsable record in queue envelope");
                continue;
            }
        };

        let kind = match message.event.as_str() {
            QUEUE_LAUNCH => EventKind::InstanceLaunch,
            QUEUE_TERMINATE => EventKind::InstanceTerminate,
            other => {
                warn!(group = %message.group_name, event = other, "unsupported event kind, skipping");
                continue;
            }
        };

        debug!(group = %message.group_name, kind = kind.as_str(), "normalized queue notification");
        notifications.push(Notification {
            kind,
            group_name: message.group_name,
            region: default_region.to_string(),
            availability_zone: None,
        });
    }

    notifications
}

fn normalize_bus(envelope: BusEnvelope) -> Option<Notification> {
    let kind = match envelope.detail_type.as_str() {
        BUS_LAUNCH => EventKind::InstanceLaunch,
        BUS_TERMINATE => EventKind::InstanceTerminate,
        other => {
            warn!(group = %envelope.detail.group_name, event = other, "unsupported event kind, skipping");
            return None;
        }
    };

    debug!(
        group = %envelope.detail.group_name,
        region = %envelope.region,
        kind = kind.as_str(),
        "normalized event-bus notification"
    );
    Some(Notification {
        kind,
        group_name: envelope.detail.group_name,
        region: envelope.region,
        availability_zone: envelope.detail.details.and_then(|d| d.availability_zone),
    })
}

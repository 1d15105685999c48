//! Fleet directory access: group membership, tags, and instance metadata.
//!
//! The [`FleetDirectory`] trait is the seam between the reconciliation
//! pipeline and the compute fleet's APIs. [`AwsFleetDirectory`] is the
//! production implementation over the Auto Scaling and EC2 APIs; tests
//! substitute an in-memory directory.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_autoscaling::types::LifecycleState as SdkLifecycleState;
use std::net::Ipv4Addr;
use tracing::{debug, warn};

use crate::error::ReconcileError;

/// Lifecycle state of a group member as reported by the fleet directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// The instance is in service and should receive traffic.
    InService,
    /// Any other state (pending, terminating, standby, ...).
    Other(String),
}

/// A key/value tag attached to a scaling group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// A member of a scaling group, before its address is resolved.
#[derive(Debug, Clone)]
pub struct GroupMember {
    /// Instance identifier.
    pub instance_id: String,
    /// Reported lifecycle state.
    pub lifecycle_state: LifecycleState,
}

/// A scaling group snapshot: its tags and current members.
#[derive(Debug, Clone)]
pub struct ScalingGroup {
    /// Group name.
    pub name: String,
    /// Tags attached to the group.
    pub tags: Vec<Tag>,
    /// Current member instances.
    pub members: Vec<GroupMember>,
}

/// An instance with its resolved address and placement.
///
/// Immutable snapshot for the duration of one reconciliation.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Instance identifier.
    pub id: String,
    /// Private IPv4 address.
    pub private_address: Ipv4Addr,
    /// Availability zone the instance is placed in. May be empty if the
    /// directory did not report one; such instances only contribute to the
    /// region-wide record.
    pub availability_zone: String,
}

/// Read access to the compute fleet's directory.
#[async_trait]
pub trait FleetDirectory {
    /// Look up a single scaling group by name.
    ///
    /// Fails with [`ReconcileError::GroupNotFound`] when the directory
    /// reports zero matching groups.
    async fn describe_group(&self, name: &str) -> Result<ScalingGroup, ReconcileError>;

    /// Resolve addresses and placement for the given instance ids.
    ///
    /// Callers must not pass an empty id list; the underlying APIs reject
    /// zero-length describe requests. Fewer results than requested is not an
    /// error.
    async fn resolve_addresses(&self, ids: &[String]) -> Result<Vec<Instance>, ReconcileError>;
}

/// Fleet directory backed by the AWS Auto Scaling and EC2 APIs.
#[derive(Clone)]
pub struct AwsFleetDirectory {
    autoscaling: aws_sdk_autoscaling::Client,
    ec2: aws_sdk_ec2::Client,
}

impl AwsFleetDirectory {
    /// Create a directory scoped to the given region.
    pub fn new(sdk_config: &SdkConfig, region: &str) -> Self {
        let autoscaling = aws_sdk_autoscaling::Client::from_conf(
            aws_sdk_autoscaling::config::Builder::from(sdk_config)
                .region(aws_sdk_autoscaling::config::Region::new(region.to_string()))
                .build(),
        );
        let ec2 = aws_sdk_ec2::Client::from_conf(
            aws_sdk_ec2::config::Builder::from(sdk_config)
                .region(aws_sdk_ec2::config::Region::new(region.to_string()))
                .build(),
        );

        Self { autoscaling, ec2 }
    }
}

#[async_trait]
impl FleetDirectory for AwsFleetDirectory {
    async fn describe_group(&self, name: &str) -> Result<ScalingGroup, ReconcileError> {
        let response = self
            .autoscaling
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(name)
            .max_records(1)
            .send()
            .await
            .map_err(|e| {
                ReconcileError::Directory(format!(
                    "{}",
                    aws_sdk_autoscaling::error::DisplayErrorContext(&e)
                ))
            })?;

        let group = response
            .auto_scaling_groups()
            .first()
            .ok_or_else(|| ReconcileError::GroupNotFound(name.to_string()))?;

        let tags = group
            .tags()
            .iter()
            .filter_map(|tag| {
                let key = tag.key()?;
                let value = tag.value()?;
                Some(Tag {
                    key: key.to_string(),
                    value: value.to_string(),
                })
            })
            .collect();

        let members = group
            .instances()
            .iter()
            .map(|instance| GroupMember {
                instance_id: instance.instance_id().to_string(),
                lifecycle_state: match instance.lifecycle_state() {
                    SdkLifecycleState::InService => LifecycleState::InService,
                    other => LifecycleState::Other(other.as_str().to_string()),
                },
            })
            .collect();

        Ok(ScalingGroup {
            name: group.auto_scaling_group_name().to_string(),
            tags,
            members,
        })
    }

    async fn resolve_addresses(&self, ids: &[String]) -> Result<Vec<Instance>, ReconcileError> {
        let response = self
            .ec2
            .describe_instances()
            .set_instance_ids(Some(ids.to_vec()))
            .dry_run(false)
            .send()
            .await
            .map_err(|e| {
                ReconcileError::Directory(format!(
                    "{}",
                    aws_sdk_ec2::error::DisplayErrorContext(&e)
                ))
            })?;

        let mut instances = Vec::with_capacity(ids.len());
        for reservation in response.reservations() {
            for instance in reservation.instances() {
                let Some(id) = instance.instance_id() else {
                    continue;
                };
                let Some(address) = instance.private_ip_address() else {
                    warn!(instance = id, "instance has no private address, skipping");
                    continue;
                };
                let private_address: Ipv4Addr = match address.parse() {
                    Ok(addr) => addr,
                    Err(_) => {
                        warn!(instance = id, address, "unparsable private address, skipping");
                        continue;
                    }
                };
                let availability_zone = instance
                    .placement()
                    .and_then(|p| p.availability_zone())
                    .unwrap_or_default()
                    .to_string();

                debug!(
                    instance = id,
                    address = %private_address,
                    zone = %availability_zone,
                    "resolved instance"
                );
                instances.push(Instance {
                    id: id.to_string(),
                    private_address,
                    availability_zone,
                });
            }
        }

        Ok(instances)
    }
}

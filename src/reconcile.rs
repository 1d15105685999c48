//! The reconciliation pipeline.
//!
//! One strictly sequential pass per notification: resolve the group,
//! extract role metadata, filter membership, resolve addresses, build the
//! desired mapping, plan changes, submit. Each stage takes the previous
//! stage's output as its sole input; any failure aborts the remaining
//! stages with nothing submitted.

use tracing::{debug, info};

use crate::config::{ReconcilePolicy, ReconcilerConfig};
use crate::directory::{FleetDirectory, GroupMember, LifecycleState};
use crate::dns::{ChangeSet, DnsStore, RecordAction, RecordChange};
use crate::error::ReconcileError;
use crate::event::Notification;
use crate::mapping::{build_mapping, AddressMapping};
use crate::metrics::{self, Timer};
use crate::role::{extract_role_metadata, RoleMetadata};

/// Summary of one completed reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Number of upserted record names.
    pub upserts: usize,
    /// Number of deleted record names.
    pub deletes: usize,
}

/// Narrow a member list to instances in the in-service lifecycle state.
///
/// Pure filter; preserves discovery order.
pub fn filter_in_service(members: &[GroupMember]) -> Vec<String> {
    members
        .iter()
        .filter(|member| member.lifecycle_state == LifecycleState::InService)
        .map(|member| member.instance_id.clone())
        .collect()
}

/// The region a notification reconciles against, honoring the policy pin.
pub fn effective_region<'a>(policy: &'a ReconcilePolicy, notification: &'a Notification) -> &'a str {
    policy
        .region_override
        .as_deref()
        .unwrap_or(&notification.region)
}

/// Drives the pipeline against a fleet directory and a DNS store.
pub struct Reconciler<D, S> {
    directory: D,
    dns: S,
    config: ReconcilerConfig,
}

impl<D: FleetDirectory, S: DnsStore> Reconciler<D, S> {
    /// Create a reconciler with the given collaborators and configuration.
    pub fn new(directory: D, dns: S, config: ReconcilerConfig) -> Self {
        Self {
            directory,
            dns,
            config,
        }
    }

    /// Run one reconciliation for a normalized notification.
    pub async fn handle(
        &self,
        notification: &Notification,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let timer = Timer::start();
        let policy = &self.config.policy;
        let region = effective_region(policy, notification);

        info!(
            group = %notification.group_name,
            region,
            kind = notification.kind.as_str(),
            "reconciling DNS records"
        );

        let group = self.directory.describe_group(&notification.group_name).await?;
        let metadata = extract_role_metadata(&group.tags, policy)?;

        let in_service = filter_in_service(&group.members);
        if in_service.is_empty() && !policy.allow_empty_membership {
            return Err(ReconcileError::NoInServiceInstances);
        }
        debug!(
            group = %group.name,
            in_service = in_service.len(),
            members = group.members.len(),
            "filtered membership"
        );

        // Zero-length describe requests are rejected upstream.
        let instances = if in_service.is_empty() {
            Vec::new()
        } else {
            self.directory.resolve_addresses(&in_service).await?
        };
        metrics::record_instances_resolved(instances.len());

        let mapping = build_mapping(&metadata, region, &instances);

        let changes = self
            .plan_changes(&metadata, region, notification.availability_zone.as_deref(), &mapping)
            .await?;

        let outcome = ReconcileOutcome {
            upserts: changes
                .iter()
                .filter(|c| c.action == RecordAction::Upsert)
                .count(),
            deletes: changes
                .iter()
                .filter(|c| c.action == RecordAction::Delete)
                .count(),
        };

        if changes.is_empty() {
            info!(group = %group.name, "no DNS changes required");
        } else {
            let batch = ChangeSet {
                zone_id: metadata.zone_id.clone(),
                changes,
            };
            self.dns.submit(&batch).await?;
            info!(
                group = %group.name,
                zone = %metadata.zone_id,
                upserts = outcome.upserts,
                deletes = outcome.deletes,
                "submitted change batch"
            );
        }

        metrics::record_changes(outcome.upserts, outcome.deletes);
        metrics::record_reconcile_duration(timer.elapsed());
        Ok(outcome)
    }

    /// Turn the desired mapping into an ordered change list: one upsert per
    /// mapped name, then deletes for canonical names that lost all of their
    /// contributing instances and still exist in the store.
    async fn plan_changes(
        &self,
        metadata: &RoleMetadata,
        region: &str,
        event_zone: Option<&str>,
        mapping: &AddressMapping,
    ) -> Result<Vec<RecordChange>, ReconcileError> {
        let mut changes: Vec<RecordChange> = mapping
            .iter()
            .map(|(name, addresses)| {
                RecordChange::upsert(name.to_string(), addresses, self.config.ttl)
            })
            .collect();

        if !self.config.policy.detect_deletions {
            return Ok(changes);
        }

        let mut candidates = vec![metadata.region_record_name(region)];
        if let Some(zone) = event_zone {
            candidates.push(metadata.zone_record_name(zone));
        }

        for name in candidates {
            if mapping.contains(&name) {
                continue;
            }
            // The store refuses blind deletions, so fetch the current values.
            match self.dns.lookup_record(&metadata.zone_id, &name).await? {
                Some(existing) => {
                    debug!(record = %name, "deleting stale record");
                    changes.push(RecordChange::delete(name, existing.values));
                }
                None => {
                    debug!(record = %name, "record already absent, nothing to delete");
                }
            }
        }

        Ok(changes)
    }
}

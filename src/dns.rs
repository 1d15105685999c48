//! DNS record store access: existing-record lookup and batched writes.
//!
//! [`DnsStore`] is the seam between the pipeline and the zone's API.
//! [`Route53Store`] is the production implementation; tests substitute an
//! in-memory store. All changes for one reconciliation travel in a single
//! [`ChangeSet`] so the store's batch atomicity is preserved.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use std::net::Ipv4Addr;
use tracing::debug;

use crate::error::ReconcileError;

/// Action to apply to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    /// Create the record or replace its value set.
    Upsert,
    /// Remove the record. Must carry the record's current values.
    Delete,
}

/// One change to an A record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// What to do.
    pub action: RecordAction,
    /// Fully-qualified record name.
    pub name: String,
    /// Record values. Desired values for an upsert; the record's current
    /// values for a delete (the store refuses deletions that do not name
    /// the exact current value set).
    pub values: Vec<String>,
    /// TTL in seconds. Set for upserts only.
    pub ttl: Option<i64>,
}

impl RecordChange {
    /// Build an upsert carrying the desired address list.
    pub fn upsert(name: String, addresses: &[Ipv4Addr], ttl: i64) -> Self {
        Self {
            action: RecordAction::Upsert,
            name,
            values: addresses.iter().map(Ipv4Addr::to_string).collect(),
            ttl: Some(ttl),
        }
    }

    /// Build a delete carrying the record's current values.
    pub fn delete(name: String, current_values: Vec<String>) -> Self {
        Self {
            action: RecordAction::Delete,
            name,
            values: current_values,
            ttl: None,
        }
    }
}

/// All changes for one reconciliation, submitted as one atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Hosted zone the changes apply to.
    pub zone_id: String,
    /// Ordered changes.
    pub changes: Vec<RecordChange>,
}

/// An A record as it currently exists in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRecord {
    /// Record name.
    pub name: String,
    /// Current values, verbatim as the store reports them.
    pub values: Vec<String>,
}

/// Write and lookup access to the DNS record store.
#[async_trait]
pub trait DnsStore {
    /// Look up the current A record for `name`, or `None` if it does not
    /// exist. Used only to authorize deletions.
    async fn lookup_record(
        &self,
        zone_id: &str,
        name: &str,
    ) -> Result<Option<ExistingRecord>, ReconcileError>;

    /// Submit all changes as one batch. Single call, no client-side retry.
    async fn submit(&self, batch: &ChangeSet) -> Result<(), ReconcileError>;
}

/// Compare record names the way the store reports them: trailing dot and
/// ASCII case are not significant.
fn record_name_matches(reported: &str, wanted: &str) -> bool {
    reported
        .trim_end_matches('.')
        .eq_ignore_ascii_case(wanted.trim_end_matches('.'))
}

/// DNS store backed by the Route53 API.
#[derive(Clone)]
pub struct Route53Store {
    client: aws_sdk_route53::Client,
}

impl Route53Store {
    /// Create a store from the shared SDK configuration. Route53 is a
    /// global service; no region scoping is needed.
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_route53::Client::new(sdk_config),
        }
    }
}

fn to_sdk_change(change: &RecordChange) -> Result<Change, ReconcileError> {
    let records = change
        .values
        .iter()
        .map(|value| ResourceRecord::builder().value(value.as_str()).build())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ReconcileError::DnsWrite(e.to_string()))?;

    let mut record_set = ResourceRecordSet::builder()
        .name(change.name.as_str())
        .r#type(RrType::A)
        .set_resource_records(Some(records));
    if let Some(ttl) = change.ttl {
        record_set = record_set.ttl(ttl);
    }
    let record_set = record_set
        .build()
        .map_err(|e| ReconcileError::DnsWrite(e.to_string()))?;

    let action = match change.action {
        RecordAction::Upsert => ChangeAction::Upsert,
        RecordAction::Delete => ChangeAction::Delete,
    };

    Change::builder()
        .action(action)
        .resource_record_set(record_set)
        .build()
        .map_err(|e| ReconcileError::DnsWrite(e.to_string()))
}

#[async_trait]
impl DnsStore for Route53Store {
    async fn lookup_record(
        &self,
        zone_id: &str,
        name: &str,
    ) -> Result<Option<ExistingRecord>, ReconcileError> {
        let response = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id)
            .start_record_name(name)
            .start_record_type(RrType::A)
            .max_items(1)
            .send()
            .await
            .map_err(|e| {
                ReconcileError::DnsLookup(format!(
                    "{}",
                    aws_sdk_route53::error::DisplayErrorContext(&e)
                ))
            })?;

        // The listing starts at the requested name but may return the
        // lexicographically next record instead; that counts as not-found.
        let Some(record_set) = response.resource_record_sets().first() else {
            return Ok(None);
        };
        if record_set.r#type() != &RrType::A || !record_name_matches(record_set.name(), name) {
            debug!(wanted = name, got = record_set.name(), "no existing record");
            return Ok(None);
        }

        let values = record_set
            .resource_records()
            .iter()
            .map(|record| record.value().to_string())
            .collect();

        Ok(Some(ExistingRecord {
            name: name.to_string(),
            values,
        }))
    }

    async fn submit(&self, batch: &ChangeSet) -> Result<(), ReconcileError> {
        let changes = batch
            .changes
            .iter()
            .map(to_sdk_change)
            .collect::<Result<Vec<_>, _>>()?;

        let change_batch = ChangeBatch::builder()
            .set_changes(Some(changes))
            .build()
            .map_err(|e| ReconcileError::DnsWrite(e.to_string()))?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(batch.zone_id.as_str())
            .change_batch(change_batch)
            .send()
            .await
            .map_err(|e| {
                ReconcileError::DnsWrite(format!(
                    "{}",
                    aws_sdk_route53::error::DisplayErrorContext(&e)
                ))
            })?;

        debug!(zone = %batch.zone_id, changes = batch.changes.len(), "change batch accepted");
        Ok(())
    }
}

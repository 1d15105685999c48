//! Shared test infrastructure for reconciliation pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use autoscale_dns::config::{ReconcilePolicy, ReconcilerConfig};
use autoscale_dns::directory::{
    FleetDirectory, GroupMember, Instance, LifecycleState, ScalingGroup, Tag,
};
use autoscale_dns::dns::{ChangeSet, DnsStore, ExistingRecord};
use autoscale_dns::error::ReconcileError;
use autoscale_dns::event::{EventKind, Notification};
use autoscale_dns::Reconciler;

// --- Constants ---

pub const ZONE_ID: &str = "Z123";
pub const REGION: &str = "eu-west-1";

// --- Config builders ---

pub fn test_config() -> ReconcilerConfig {
    ReconcilerConfig {
        default_region: REGION.to_string(),
        ttl: 300,
        policy: ReconcilePolicy::default(),
    }
}

pub fn config_with_policy(policy: ReconcilePolicy) -> ReconcilerConfig {
    ReconcilerConfig {
        policy,
        ..test_config()
    }
}

/// The legacy strict flavor: abort on empty membership, upserts only.
pub fn strict_policy() -> ReconcilePolicy {
    ReconcilePolicy {
        allow_empty_membership: false,
        detect_deletions: false,
        ..ReconcilePolicy::default()
    }
}

// --- Domain object builders ---

pub fn tag(key: &str, value: &str) -> Tag {
    Tag {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// The standard DNS opt-in tag set.
pub fn dns_tags(role: &str) -> Vec<Tag> {
    vec![
        tag("role", role),
        tag("r53-domain-name", "example.com"),
        tag("r53-zone-id", ZONE_ID),
    ]
}

pub fn in_service(instance_id: &str) -> GroupMember {
    GroupMember {
        instance_id: instance_id.to_string(),
        lifecycle_state: LifecycleState::InService,
    }
}

pub fn terminating(instance_id: &str) -> GroupMember {
    GroupMember {
        instance_id: instance_id.to_string(),
        lifecycle_state: LifecycleState::Other("Terminating".to_string()),
    }
}

pub fn make_group(name: &str, tags: Vec<Tag>, members: Vec<GroupMember>) -> ScalingGroup {
    ScalingGroup {
        name: name.to_string(),
        tags,
        members,
    }
}

pub fn make_instance(id: &str, address: &str, zone: &str) -> Instance {
    Instance {
        id: id.to_string(),
        private_address: address.parse().unwrap(),
        availability_zone: zone.to_string(),
    }
}

pub fn launch_notification(group_name: &str, availability_zone: Option<&str>) -> Notification {
    Notification {
        kind: EventKind::InstanceLaunch,
        group_name: group_name.to_string(),
        region: REGION.to_string(),
        availability_zone: availability_zone.map(String::from),
    }
}

pub fn terminate_notification(group_name: &str, availability_zone: Option<&str>) -> Notification {
    Notification {
        kind: EventKind::InstanceTerminate,
        group_name: group_name.to_string(),
        region: REGION.to_string(),
        availability_zone: availability_zone.map(String::from),
    }
}

// --- FakeDirectory ---

/// In-memory fleet directory with call counters.
#[derive(Default)]
pub struct FakeDirectory {
    groups: HashMap<String, ScalingGroup>,
    instances: HashMap<String, Instance>,
    describe_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: ScalingGroup) -> Self {
        self.groups.insert(group.name.clone(), group);
        self
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instances.insert(instance.id.clone(), instance);
        self
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FleetDirectory for &FakeDirectory {
    async fn describe_group(&self, name: &str) -> Result<ScalingGroup, ReconcileError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        self.groups
            .get(name)
            .cloned()
            .ok_or_else(|| ReconcileError::GroupNotFound(name.to_string()))
    }

    async fn resolve_addresses(&self, ids: &[String]) -> Result<Vec<Instance>, ReconcileError> {
        assert!(
            !ids.is_empty(),
            "resolve_addresses must not be called with an empty id list"
        );
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ids
            .iter()
            .filter_map(|id| self.instances.get(id).cloned())
            .collect())
    }
}

// --- FakeDnsStore ---

/// In-memory DNS store recording lookups and submitted batches.
#[derive(Default)]
pub struct FakeDnsStore {
    records: HashMap<String, Vec<String>>,
    fail_lookups: bool,
    lookups: Mutex<Vec<String>>,
    submitted: Mutex<Vec<ChangeSet>>,
}

impl FakeDnsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing A record.
    pub fn with_record(mut self, name: &str, values: &[&str]) -> Self {
        self.records
            .insert(name.to_string(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Make every lookup fail with a `DnsLookup` error.
    pub fn with_failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Names looked up, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    /// Batches submitted, in order.
    pub fn submitted(&self) -> Vec<ChangeSet> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsStore for &FakeDnsStore {
    async fn lookup_record(
        &self,
        _zone_id: &str,
        name: &str,
    ) -> Result<Option<ExistingRecord>, ReconcileError> {
        if self.fail_lookups {
            return Err(ReconcileError::DnsLookup("lookup refused".to_string()));
        }
        self.lookups.lock().unwrap().push(name.to_string());
        Ok(self.records.get(name).map(|values| ExistingRecord {
            name: name.to_string(),
            values: values.clone(),
        }))
    }

    async fn submit(&self, batch: &ChangeSet) -> Result<(), ReconcileError> {
        self.submitted.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

// --- Reconciler construction ---

pub fn build_reconciler<'a>(
    directory: &'a FakeDirectory,
    dns: &'a FakeDnsStore,
    config: ReconcilerConfig,
) -> Reconciler<&'a FakeDirectory, &'a FakeDnsStore> {
    Reconciler::new(directory, dns, config)
}

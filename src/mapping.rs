//! Address mapping: the desired DNS state derived from surviving instances.
//!
//! Every instance contributes its address to exactly two record names: the
//! region-wide name and its availability-zone name. A name exists in the
//! mapping iff at least one instance contributes to it, so the absence of a
//! canonical name is what signals downstream that the record went stale.

use indexmap::map::Entry;
use indexmap::IndexMap;
use std::net::Ipv4Addr;
use tracing::debug;

use crate::directory::Instance;
use crate::role::RoleMetadata;

/// Desired record-name → address-list state for one reconciliation.
///
/// Names keep first-seen order and address lists keep instance discovery
/// order, duplicates included (multi-value record semantics). Built fresh
/// per invocation; never merged with a prior mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressMapping {
    entries: IndexMap<String, Vec<Ipv4Addr>>,
}

impl AddressMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an address to the list for `name`, creating the list on first
    /// occurrence.
    fn append(&mut self, name: String, address: Ipv4Addr) {
        match self.entries.entry(name) {
            Entry::Occupied(mut slot) => slot.get_mut().push(address),
            Entry::Vacant(slot) => {
                debug!(record = %slot.key(), "new record name");
                slot.insert(vec![address]);
            }
        }
    }

    /// Whether `name` has at least one contributing instance.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Addresses for `name`, in discovery order.
    pub fn get(&self, name: &str) -> Option<&[Ipv4Addr]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Iterate names and address lists in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Ipv4Addr])> {
        self.entries
            .iter()
            .map(|(name, addrs)| (name.as_str(), addrs.as_slice()))
    }

    /// Number of record names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping holds no record names.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregate resolved instances into the desired DNS state for a role.
///
/// Deterministic: the same instance list always yields the same mapping.
pub fn build_mapping(
    metadata: &RoleMetadata,
    region: &str,
    instances: &[Instance],
) -> AddressMapping {
    let mut mapping = AddressMapping::new();

    for instance in instances {
        mapping.append(metadata.region_record_name(region), instance.private_address);

        // Instances without a reported zone still count region-wide.
        if !instance.availability_zone.is_empty() {
            mapping.append(
                metadata.zone_record_name(&instance.availability_zone),
                instance.private_address,
            );
        }
    }

    mapping
}

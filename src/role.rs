//! Role metadata extraction from scaling-group tags.
//!
//! A group opts into DNS management with three well-known tags: the role
//! name, the DNS domain suffix, and the hosted-zone ID. Extraction is
//! all-or-nothing: a partially-populated [`RoleMetadata`] never reaches the
//! rest of the pipeline.

use crate::config::ReconcilePolicy;
use crate::directory::Tag;
use crate::error::ReconcileError;

/// Tag key naming the role served by the group's instances.
pub const ROLE_TAG: &str = "role";

/// Tag key naming the DNS domain suffix records are created under.
pub const DOMAIN_NAME_TAG: &str = "r53-domain-name";

/// Tag key naming the hosted zone changes are submitted to.
pub const ZONE_ID_TAG: &str = "r53-zone-id";

/// DNS targeting data for one role, extracted from group tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMetadata {
    /// Role name, the leftmost label of every record.
    pub role: String,
    /// Domain suffix records live under.
    pub domain_suffix: String,
    /// Hosted-zone ID changes are submitted to.
    pub zone_id: String,
}

impl RoleMetadata {
    /// Region-wide record name: `{role}.{region}.i.{domain_suffix}`.
    pub fn region_record_name(&self, region: &str) -> String {
        format!("{}.{}.i.{}", self.role, region, self.domain_suffix)
    }

    /// Per-zone record name: `{role}.{zone}.i.{domain_suffix}`.
    pub fn zone_record_name(&self, availability_zone: &str) -> String {
        format!("{}.{}.i.{}", self.role, availability_zone, self.domain_suffix)
    }
}

/// Extract role metadata from a group's tags.
///
/// The tag set is scanned once; when a key appears more than once the last
/// occurrence wins. Empty values count as missing. The three fields are
/// checked in a fixed order (role, domain, zone-id) so the first missing tag
/// is reported deterministically. Policy overrides replace the domain and
/// zone-id tags entirely; a group running under overrides only needs the
/// role tag.
pub fn extract_role_metadata(
    tags: &[Tag],
    policy: &ReconcilePolicy,
) -> Result<RoleMetadata, ReconcileError> {
    let mut role = None;
    let mut domain_suffix = None;
    let mut zone_id = None;

    for tag in tags {
        if tag.value.is_empty() {
            continue;
        }
        match tag.key.as_str() {
            ROLE_TAG => role = Some(tag.value.clone()),
            DOMAIN_NAME_TAG => domain_suffix = Some(tag.value.clone()),
            ZONE_ID_TAG => zone_id = Some(tag.value.clone()),
            _ => {}
        }
    }

    let role = role.ok_or(ReconcileError::MissingRequiredTag(ROLE_TAG))?;
    let domain_suffix = policy
        .domain_override
        .clone()
        .or(domain_suffix)
        .ok_or(ReconcileError::MissingRequiredTag(DOMAIN_NAME_TAG))?;
    let zone_id = policy
        .zone_id_override
        .clone()
        .or(zone_id)
        .ok_or(ReconcileError::MissingRequiredTag(ZONE_ID_TAG))?;

    Ok(RoleMetadata {
        role,
        domain_suffix,
        zone_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(key: &str, value: &str) -> Tag {
        Tag {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn full_tags() -> Vec<Tag> {
        vec![
            tag(ROLE_TAG, "web"),
            tag(DOMAIN_NAME_TAG, "example.com"),
            tag(ZONE_ID_TAG, "Z123"),
        ]
    }

    #[test]
    fn test_extracts_all_three_tags() {
        let meta = extract_role_metadata(&full_tags(), &ReconcilePolicy::default()).unwrap();
        assert_eq!(meta.role, "web");
        assert_eq!(meta.domain_suffix, "example.com");
        assert_eq!(meta.zone_id, "Z123");
    }

    #[test]
    fn test_unrelated_tags_are_ignored() {
        let mut tags = full_tags();
        tags.insert(0, tag("Name", "web-asg"));
        tags.push(tag("environment", "production"));

        let meta = extract_role_metadata(&tags, &ReconcilePolicy::default()).unwrap();
        assert_eq!(meta.role, "web");
    }

    #[test]
    fn test_missing_role_tag_fails() {
        let tags = vec![tag(DOMAIN_NAME_TAG, "example.com"), tag(ZONE_ID_TAG, "Z123")];
        let err = extract_role_metadata(&tags, &ReconcilePolicy::default()).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingRequiredTag(ROLE_TAG)));
    }

    #[test]
    fn test_missing_domain_tag_is_reported_even_with_role_present() {
        let tags = vec![tag(ROLE_TAG, "web"), tag(ZONE_ID_TAG, "Z123")];
        let err = extract_role_metadata(&tags, &ReconcilePolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::MissingRequiredTag(DOMAIN_NAME_TAG)
        ));
    }

    #[test]
    fn test_missing_zone_tag_fails_last_in_check_order() {
        let tags = vec![tag(ROLE_TAG, "web"), tag(DOMAIN_NAME_TAG, "example.com")];
        let err = extract_role_metadata(&tags, &ReconcilePolicy::default()).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingRequiredTag(ZONE_ID_TAG)));
    }

    #[test]
    fn test_empty_tag_value_counts_as_missing() {
        let tags = vec![
            tag(ROLE_TAG, "web"),
            tag(DOMAIN_NAME_TAG, ""),
            tag(ZONE_ID_TAG, "Z123"),
        ];
        let err = extract_role_metadata(&tags, &ReconcilePolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::MissingRequiredTag(DOMAIN_NAME_TAG)
        ));
    }

    #[test]
    fn test_duplicate_tag_key_last_wins() {
        let mut tags = full_tags();
        tags.push(tag(ROLE_TAG, "api"));

        let meta = extract_role_metadata(&tags, &ReconcilePolicy::default()).unwrap();
        assert_eq!(meta.role, "api");
    }

    #[test]
    fn test_overrides_replace_tag_values() {
        let policy = ReconcilePolicy {
            domain_override: Some("override.net".to_string()),
            zone_id_override: Some("Z999".to_string()),
            ..ReconcilePolicy::default()
        };

        let meta = extract_role_metadata(&full_tags(), &policy).unwrap();
        assert_eq!(meta.domain_suffix, "override.net");
        assert_eq!(meta.zone_id, "Z999");
    }

    #[test]
    fn test_overrides_allow_groups_without_dns_tags() {
        let policy = ReconcilePolicy {
            domain_override: Some("override.net".to_string()),
            zone_id_override: Some("Z999".to_string()),
            ..ReconcilePolicy::default()
        };
        let tags = vec![tag(ROLE_TAG, "web")];

        let meta = extract_role_metadata(&tags, &policy).unwrap();
        assert_eq!(meta.role, "web");
        assert_eq!(meta.domain_suffix, "override.net");
        assert_eq!(meta.zone_id, "Z999");
    }

    #[test]
    fn test_record_names() {
        let meta = RoleMetadata {
            role: "web".to_string(),
            domain_suffix: "example.com".to_string(),
            zone_id: "Z123".to_string(),
        };
        assert_eq!(
            meta.region_record_name("eu-west-1"),
            "web.eu-west-1.i.example.com"
        );
        assert_eq!(
            meta.zone_record_name("eu-west-1a"),
            "web.eu-west-1a.i.example.com"
        );
    }
}

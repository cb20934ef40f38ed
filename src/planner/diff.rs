//! Diff engine for comparing desired vs observed state.
//!
//! This module computes the minimal set of changes that moves a resource
//! from what the server reports to what the caller asked for. A change set
//! is empty exactly when nothing has to be sent to the server.

use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use tracing::debug;

use crate::api::types::zone_names_equal;
use crate::api::{Observed, ObservedGroup, PropertyDefinition, PropertyValue, User, Zone};
use crate::config::{
    DesiredState, GroupParams, PropertyParams, UpdatePassword, UserParams, ZoneParams,
};

/// Shown in place of a password in change details.
const MASKED: &str = "********";

/// Engine for computing diffs between desired and observed states.
#[derive(Debug, Default)]
pub struct DiffEngine;

/// Detail about a specific difference.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DiffDetail {
    /// Field that differs.
    pub field: String,
    /// Current value.
    pub old_value: Option<String>,
    /// Desired value.
    pub new_value: Option<String>,
}

/// Changes required for a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupChangeSet {
    /// New description, if it has to change.
    pub description: Option<String>,
    /// Members to add, in the order the caller listed them.
    pub members_to_add: Vec<String>,
    /// Members to remove.
    pub members_to_remove: Vec<String>,
    /// Human-readable differences.
    pub details: Vec<DiffDetail>,
}

/// Changes required for a user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChangeSet {
    /// Properties to send in an update call.
    pub patch: Vec<PropertyValue>,
    /// Groups to join.
    pub groups_to_add: Vec<String>,
    /// Groups to leave.
    pub groups_to_remove: Vec<String>,
    /// Roles to assign.
    pub roles_to_add: Vec<String>,
    /// Roles to revoke.
    pub roles_to_remove: Vec<String>,
    /// Human-readable differences.
    pub details: Vec<DiffDetail>,
}

/// Changes required for a zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneChangeSet {
    /// Properties to send in an update call.
    pub patch: Vec<PropertyValue>,
    /// Human-readable differences.
    pub details: Vec<DiffDetail>,
    /// Differences in fields the server does not allow to change.
    pub read_only: Vec<DiffDetail>,
}

/// Changes required for a property definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyChangeSet {
    /// Human-readable differences; non-empty means the definition is replaced.
    pub details: Vec<DiffDetail>,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the changes needed for a group.
    ///
    /// For an absent group the change set describes the full creation.
    #[must_use]
    pub fn diff_group(
        &self,
        desired: &GroupParams,
        current: &Observed<ObservedGroup>,
    ) -> GroupChangeSet {
        let mut changes = GroupChangeSet::default();
        if desired.state == DesiredState::Absent {
            return changes;
        }

        let wanted = dedup(desired.users.as_deref().unwrap_or_default());

        match current {
            Observed::Absent => {
                changes.description = desired.desc.clone().filter(|d| !d.is_empty());
                changes.details.push(detail("group", None, Some(&desired.name)));
                changes.members_to_add = wanted;
            }
            Observed::Present(group) => {
                if let Some(desc) = &desired.desc
                    && *desc != group.description
                {
                    changes.description = Some(desc.clone());
                    changes
                        .details
                        .push(detail("description", Some(&group.description), Some(desc)));
                }

                if desired.users.is_some() {
                    changes.members_to_add = wanted
                        .iter()
                        .filter(|u| !group.members.contains_key(*u))
                        .cloned()
                        .collect();
                    changes.members_to_remove = group
                        .members
                        .keys()
                        .filter(|u| !wanted.contains(u))
                        .cloned()
                        .collect();
                }
            }
        }

        for user in &changes.members_to_add {
            changes.details.push(detail("users", None, Some(user)));
        }
        for user in &changes.members_to_remove {
            changes.details.push(detail("users", Some(user), None));
        }

        debug!(
            "Group {}: {} to add, {} to remove",
            desired.name,
            changes.members_to_add.len(),
            changes.members_to_remove.len()
        );
        changes
    }

    /// Computes the changes needed for a user.
    ///
    /// The stored password cannot be read back, so it is only part of the
    /// patch with [`UpdatePassword::Always`]. `groups` and `roles` are
    /// compared by name and only when supplied.
    #[must_use]
    pub fn diff_user(&self, desired: &UserParams, current: &Observed<User>) -> UserChangeSet {
        let mut changes = UserChangeSet::default();
        if desired.state == DesiredState::Absent {
            return changes;
        }

        let wanted_groups = dedup(desired.groups.as_deref().unwrap_or_default());
        let wanted_roles = dedup(desired.roles.as_deref().unwrap_or_default());

        let user = match current {
            Observed::Absent => {
                changes.details.push(detail("user", None, Some(&desired.name)));
                changes.groups_to_add = wanted_groups;
                changes.roles_to_add = wanted_roles;
                changes.push_memberships();
                return changes;
            }
            Observed::Present(user) => user,
        };

        let fields = [
            ("fullName", desired.full_name.as_deref(), user.full_name.as_str()),
            ("description", desired.desc.as_deref(), user.description.as_str()),
            ("email", desired.email.as_deref(), user.email.as_str()),
        ];
        for (field, wanted, have) in fields {
            if let Some(wanted) = wanted
                && wanted != have
            {
                changes.push(field, Some(have), wanted);
            }
        }

        if let Some(kind) = desired.api_authentication_type()
            && !kind.eq_ignore_ascii_case(&user.authentication_type)
        {
            changes.push("authenticationType", Some(&user.authentication_type), &kind);
        }

        if desired.update_password == UpdatePassword::Always
            && let Some(password) = &desired.password
        {
            changes
                .details
                .push(detail("password", Some(MASKED), Some(MASKED)));
            changes
                .patch
                .push(PropertyValue::new("password", password.as_str()));
        }

        if desired.groups.is_some() {
            (changes.groups_to_add, changes.groups_to_remove) =
                set_difference(&wanted_groups, &user.group_names());
        }
        if desired.roles.is_some() {
            (changes.roles_to_add, changes.roles_to_remove) =
                set_difference(&wanted_roles, &user.role_names());
        }
        changes.push_memberships();

        debug!(
            "User {}: {} properties, {} group and {} role changes",
            desired.name,
            changes.patch.len(),
            changes.groups_to_add.len() + changes.groups_to_remove.len(),
            changes.roles_to_add.len() + changes.roles_to_remove.len()
        );
        changes
    }

    /// Computes the changes needed for a zone.
    ///
    /// Only attributes the caller supplied are compared. Custom properties
    /// are merged: properties that are not mentioned are left alone.
    #[must_use]
    pub fn diff_zone(&self, desired: &ZoneParams, current: &Observed<Zone>) -> ZoneChangeSet {
        let mut changes = ZoneChangeSet::default();
        if desired.state == DesiredState::Absent {
            return changes;
        }

        let Observed::Present(zone) = current else {
            changes.details.push(detail("zone", None, Some(&desired.name)));
            return changes;
        };

        let servtype = desired.servtype.api_name();
        if !servtype.eq_ignore_ascii_case(&zone.zone_type) {
            changes.push("type", Some(&zone.zone_type), servtype, json!(servtype));
        }

        if desired.servtype.needs_masters()
            && let Some(masters) = &desired.masters
        {
            let wanted: BTreeSet<&str> = masters.iter().map(String::as_str).collect();
            let have: BTreeSet<&str> = zone.masters.iter().map(String::as_str).collect();
            if wanted != have {
                changes.push(
                    "masters",
                    Some(&zone.masters.join(",")),
                    &masters.join(","),
                    json!(masters),
                );
            }
        }

        if let Some(dynamic) = desired.dynamic
            && dynamic != zone.dynamic
        {
            changes.push(
                "dynamic",
                Some(&zone.dynamic.to_string()),
                &dynamic.to_string(),
                json!(dynamic),
            );
        }

        if let Some(ad) = desired.adintegrated
            && Some(ad) != zone.ad_integrated
        {
            changes.push(
                "adIntegrated",
                zone.ad_integrated.map(|b| b.to_string()).as_deref(),
                &ad.to_string(),
                json!(ad),
            );
        }

        if let Some(kind) = &desired.adreplicationtype
            && Some(kind) != zone.ad_replication_type.as_ref()
        {
            changes.push(
                "adReplicationType",
                zone.ad_replication_type.as_deref(),
                kind,
                json!(kind),
            );
        }

        if let Some(partition) = &desired.adpartition
            && Some(partition) != zone.ad_partition.as_ref()
        {
            changes.push(
                "adPartition",
                zone.ad_partition.as_deref(),
                partition,
                json!(partition),
            );
        }

        for (key, value) in &desired.customproperties {
            let have = zone.custom_properties.get(key);
            if have != Some(value) {
                changes.push(key, have.map(String::as_str), value, json!(value));
            }
        }

        if let Some(authority) = &desired.authority {
            let same = zone
                .authority
                .as_deref()
                .is_some_and(|a| zone_names_equal(a, authority));
            if !same {
                changes.read_only.push(detail(
                    "authority",
                    zone.authority.as_deref(),
                    Some(authority),
                ));
            }
        }

        debug!("Zone {}: {} properties to patch", desired.name, changes.patch.len());
        changes
    }

    /// Computes the changes needed for a property definition.
    #[must_use]
    pub fn diff_property(
        &self,
        desired: &PropertyParams,
        current: &Observed<PropertyDefinition>,
    ) -> PropertyChangeSet {
        let mut changes = PropertyChangeSet::default();
        if desired.state == DesiredState::Absent {
            return changes;
        }

        let wanted = desired_definition(desired);
        let Observed::Present(have) = current else {
            changes
                .details
                .push(detail("propertyDefinition", None, Some(&wanted.name)));
            return changes;
        };

        let mut compare = |field: &str, old: String, new: String| {
            if old != new {
                changes.details.push(detail(field, Some(&old), Some(&new)));
            }
        };

        compare("type", have.property_type.clone(), wanted.property_type.clone());
        compare("system", have.system.to_string(), wanted.system.to_string());
        compare("mandatory", have.mandatory.to_string(), wanted.mandatory.to_string());
        compare("readOnly", have.read_only.to_string(), wanted.read_only.to_string());
        compare("multiLine", have.multi_line.to_string(), wanted.multi_line.to_string());
        compare("defaultValue", have.default_value.clone(), wanted.default_value.clone());

        // The server reports empty lists for non-text properties.
        if desired.proptype.supports_lists() {
            compare("listItems", have.list_items.join(","), wanted.list_items.join(","));
            compare("cloudTags", have.cloud_tags.join(","), wanted.cloud_tags.join(","));
        }

        changes
    }
}

/// Builds the definition the server should hold for the given parameters.
#[must_use]
pub fn desired_definition(params: &PropertyParams) -> PropertyDefinition {
    let lists = params.proptype.supports_lists();
    PropertyDefinition {
        name: params.name.clone(),
        property_type: params.proptype.api_name().to_string(),
        system: params.system,
        mandatory: params.mandatory,
        read_only: params.readonly,
        multi_line: params.multiline,
        default_value: params.defaultvalue.clone(),
        list_items: if lists { params.listitems.clone() } else { Vec::new() },
        cloud_tags: if lists { params.cloudtags.clone() } else { Vec::new() },
    }
}

impl GroupChangeSet {
    /// Returns true if nothing has to change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.members_to_add.is_empty()
            && self.members_to_remove.is_empty()
    }
}

impl UserChangeSet {
    /// Returns true if nothing has to change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.patch.is_empty()
            && self.groups_to_add.is_empty()
            && self.groups_to_remove.is_empty()
            && self.roles_to_add.is_empty()
            && self.roles_to_remove.is_empty()
    }

    fn push(&mut self, field: &str, old: Option<&str>, new: &str) {
        self.details.push(detail(field, old, Some(new)));
        self.patch.push(PropertyValue::new(field, new));
    }

    fn push_memberships(&mut self) {
        let lists = [
            ("groups", &self.groups_to_add, &self.groups_to_remove),
            ("roles", &self.roles_to_add, &self.roles_to_remove),
        ];
        let mut details = Vec::new();
        for (field, added, removed) in lists {
            details.extend(added.iter().map(|n| detail(field, None, Some(n))));
            details.extend(removed.iter().map(|n| detail(field, Some(n), None)));
        }
        self.details.extend(details);
    }
}

impl ZoneChangeSet {
    /// Returns true if nothing has to change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.patch.is_empty()
    }

    fn push(&mut self, field: &str, old: Option<&str>, new: &str, value: Value) {
        self.details.push(detail(field, old, Some(new)));
        self.patch.push(PropertyValue::new(field, value));
    }
}

impl PropertyChangeSet {
    /// Returns true if nothing has to change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.details.is_empty()
    }
}

fn detail(field: &str, old: Option<&str>, new: Option<&str>) -> DiffDetail {
    DiffDetail {
        field: field.to_string(),
        old_value: old.map(String::from),
        new_value: new.map(String::from),
    }
}

/// Splits names into those to add and those to remove.
///
/// Additions keep the order of `wanted`.
fn set_difference(wanted: &[String], have: &[&str]) -> (Vec<String>, Vec<String>) {
    let to_add = wanted
        .iter()
        .filter(|w| !have.contains(&w.as_str()))
        .cloned()
        .collect();
    let to_remove = have
        .iter()
        .filter(|h| !wanted.iter().any(|w| w == *h))
        .map(|h| (*h).to_string())
        .collect();
    (to_add, to_remove)
}

/// Removes repeated names, keeping the first occurrence.
fn dedup(names: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .filter(|n| seen.insert(n.as_str()))
        .cloned()
        .collect()
}

impl std::fmt::Display for DiffDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.old_value, &self.new_value) {
            (None, Some(new)) => write!(f, "+ {}: {new}", self.field),
            (Some(old), None) => write!(f, "- {}: {old}", self.field),
            (Some(old), Some(new)) => write!(f, "~ {}: {old} -> {new}", self.field),
            (None, None) => write!(f, "  {}", self.field),
        }
    }
}

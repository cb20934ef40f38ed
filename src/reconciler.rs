//! Reconciler for maintaining desired state.
//!
//! This module reads the current state of a resource, computes the change
//! set against the desired state and applies it with the fewest calls.

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::api::{
    MicetroApi, ObjectRef, Observed, ObservedGroup, PropertyValue, ResourceKind, ResourceReader,
    User, UserSpec, Zone, ZoneSpec,
};
use crate::config::{GroupParams, PropertyParams, UserParams, ZoneParams};
use crate::error::{ApiError, ConfigError, MicetroError, ReconcileError, Result};
use crate::planner::{
    DiffDetail, DiffEngine, GroupChangeSet, ReconcileAction, UserChangeSet, desired_definition,
};

/// Zone attributes that live on the zone itself rather than in its custom properties.
const ZONE_FIELDS: [&str; 6] = [
    "type",
    "masters",
    "dynamic",
    "adIntegrated",
    "adReplicationType",
    "adPartition",
];

/// Reconciler for maintaining desired state.
pub struct Reconciler<'a, A: MicetroApi + ?Sized> {
    /// API implementation.
    api: &'a A,
    /// Reader for current state.
    reader: ResourceReader<'a, A>,
    /// Diff engine.
    diff_engine: DiffEngine,
    /// Read and diff only.
    check_mode: bool,
}

/// A failure limited to one item of a resource.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemError {
    /// The item that failed, e.g. a user name.
    pub item: String,
    /// What went wrong.
    pub message: String,
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    /// Whether anything changed (or would change, in check mode).
    pub changed: bool,
    /// Action taken.
    pub action: ReconcileAction,
    /// The action was computed but not applied.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub planned: bool,
    /// Snapshot of the resource after the call; null when it does not exist.
    pub resource: Value,
    /// Per-item failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
    /// Requested changes that were not applied.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Differences found.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diff: Vec<DiffDetail>,
    /// Human-readable summary.
    pub message: String,
}

/// Outcome of member processing.
#[derive(Default)]
struct MemberReport {
    applied: usize,
    errors: Vec<ItemError>,
}

/// What a user is a member of.
#[derive(Debug, Clone, Copy)]
enum Membership {
    Group,
    Role,
}

impl<'a, A: MicetroApi + ?Sized> Reconciler<'a, A> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(api: &'a A) -> Self {
        Self {
            api,
            reader: ResourceReader::new(api),
            diff_engine: DiffEngine::new(),
            check_mode: false,
        }
    }

    /// Enables check mode: no mutating call is made.
    #[must_use]
    pub const fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    /// Reconciles a group and its membership.
    ///
    /// Members that cannot be resolved or added are reported in
    /// [`ReconciliationResult::errors`] without aborting the call.
    ///
    /// # Errors
    ///
    /// Returns an error on authentication, transport or server failures
    /// outside member processing.
    pub async fn reconcile_group(&self, desired: &GroupParams) -> Result<ReconciliationResult> {
        let current = self.reader.read_group(&desired.name).await?;
        let changes = self.diff_engine.diff_group(desired, &current);
        let action =
            ReconcileAction::decide(desired.state, current.is_present(), !changes.is_empty());
        info!("{}", action.description("group", &desired.name));

        match (action, current) {
            (ReconcileAction::Create, _) => self.create_group(desired, changes).await,
            (ReconcileAction::Update, Observed::Present(group)) => {
                self.update_group(group, changes).await
            }
            (ReconcileAction::Delete, Observed::Present(group)) => {
                if !self.check_mode {
                    self.api.delete_group(&group.reference).await?;
                }
                Ok(self.finish(action, true, Value::Null, "group", &desired.name))
            }
            (_, current) => {
                let snapshot = current.as_present().map_or(Value::Null, group_snapshot);
                Ok(self.finish(action, false, snapshot, "group", &desired.name))
            }
        }
    }

    async fn create_group(
        &self,
        desired: &GroupParams,
        changes: GroupChangeSet,
    ) -> Result<ReconciliationResult> {
        let description = changes.description.clone().unwrap_or_default();
        let reference = if self.check_mode {
            None
        } else {
            Some(self.api.create_group(&desired.name, &description).await?)
        };

        let mut group = ObservedGroup {
            reference: reference.clone().unwrap_or_default(),
            name: desired.name.clone(),
            description,
            members: BTreeMap::new(),
        };
        let report = self
            .add_members(&mut group, reference.as_deref(), &changes.members_to_add)
            .await?;

        let mut result = self.finish(
            ReconcileAction::Create,
            true,
            group_snapshot(&group),
            "group",
            &desired.name,
        );
        result.diff = changes.details;
        Ok(result.with_errors(report.errors))
    }

    async fn update_group(
        &self,
        mut group: ObservedGroup,
        changes: GroupChangeSet,
    ) -> Result<ReconciliationResult> {
        let target = (!self.check_mode).then(|| group.reference.clone());
        let mut changed = false;

        if let Some(description) = &changes.description {
            if let Some(reference) = &target {
                let patch = [PropertyValue::new("description", description.as_str())];
                self.api.update_group(reference, &patch).await?;
            }
            group.description.clone_from(description);
            changed = true;
        }

        let mut report = self
            .add_members(&mut group, target.as_deref(), &changes.members_to_add)
            .await?;
        let removed = self
            .remove_members(&mut group, target.as_deref(), &changes.members_to_remove)
            .await?;
        report.applied += removed.applied;
        report.errors.extend(removed.errors);
        changed |= report.applied > 0;

        let name = group.name.clone();
        let mut result = self.finish(
            ReconcileAction::Update,
            changed,
            group_snapshot(&group),
            "group",
            &name,
        );
        result.diff = changes.details;
        Ok(result.with_errors(report.errors))
    }

    /// Resolves and adds members one by one.
    ///
    /// `target` is `None` in check mode; users are still resolved.
    async fn add_members(
        &self,
        group: &mut ObservedGroup,
        target: Option<&str>,
        users: &[String],
    ) -> Result<MemberReport> {
        let mut report = MemberReport::default();

        for user in users {
            let found = match self.api.find_user(user).await {
                Ok(found) => found,
                Err(err) if err.is_item_level() => {
                    report.push(user, err.to_string());
                    continue;
                }
                Err(err) => return Err(err),
            };

            let Some(found) = found else {
                let err = ReconcileError::UnresolvedMember {
                    group: group.name.clone(),
                    user: user.clone(),
                };
                warn!("{err}");
                report.push(user, err.to_string());
                continue;
            };

            if let Some(group_ref) = target
                && let Err(err) = self.api.add_group_member(group_ref, &found.reference).await
            {
                if !err.is_item_level() {
                    return Err(err);
                }
                let err = member_failure("add", &group.name, user, &err);
                warn!("{err}");
                report.push(user, err.to_string());
                continue;
            }

            debug!("Added {user} to group {}", group.name);
            group.members.insert(user.clone(), found.reference);
            report.applied += 1;
        }

        Ok(report)
    }

    async fn remove_members(
        &self,
        group: &mut ObservedGroup,
        target: Option<&str>,
        users: &[String],
    ) -> Result<MemberReport> {
        let mut report = MemberReport::default();

        for user in users {
            let Some(user_ref) = group.members.get(user).cloned() else {
                continue;
            };

            if let Some(group_ref) = target
                && let Err(err) = self.api.remove_group_member(group_ref, &user_ref).await
            {
                if !err.is_item_level() {
                    return Err(err);
                }
                let err = member_failure("remove", &group.name, user, &err);
                warn!("{err}");
                report.push(user, err.to_string());
                continue;
            }

            debug!("Removed {user} from group {}", group.name);
            group.members.remove(user);
            report.applied += 1;
        }

        Ok(report)
    }

    /// Reconciles a user account with its groups and roles.
    ///
    /// Every requested group and role is resolved before anything is
    /// changed. Group or role changes the server rejects are reported in
    /// [`ReconciliationResult::errors`].
    ///
    /// # Errors
    ///
    /// Returns a validation error if a missing user lacks a password or
    /// authentication type, a not-found error for an unknown group or
    /// role, or any API failure outside membership changes.
    pub async fn reconcile_user(&self, desired: &UserParams) -> Result<ReconciliationResult> {
        let current = self.reader.read_user(&desired.name).await?;
        let changes = self.diff_engine.diff_user(desired, &current);
        let action =
            ReconcileAction::decide(desired.state, current.is_present(), !changes.is_empty());
        info!("{}", action.description("user", &desired.name));

        let mut result = match (action, current) {
            (ReconcileAction::Create, _) => self.create_user(desired, &changes).await?,
            (ReconcileAction::Update, Observed::Present(user)) => {
                self.update_user(user, &changes).await?
            }
            (ReconcileAction::Delete, Observed::Present(user)) => {
                if !self.check_mode {
                    self.api.delete_user(&user.reference).await?;
                }
                self.finish(action, true, Value::Null, "user", &desired.name)
            }
            (_, current) => {
                let snapshot = current.as_present().map_or(Value::Null, user_snapshot);
                self.finish(action, false, snapshot, "user", &desired.name)
            }
        };

        result.diff = changes.details;
        Ok(result)
    }

    async fn create_user(
        &self,
        desired: &UserParams,
        changes: &UserChangeSet,
    ) -> Result<ReconciliationResult> {
        let password = desired.password.clone().filter(|p| !p.is_empty());
        let (Some(password), Some(authentication_type)) =
            (password, desired.api_authentication_type())
        else {
            let field = if desired.password.as_deref().is_none_or(str::is_empty) {
                "password"
            } else {
                "authentication_type"
            };
            return Err(ConfigError::validation(
                format!("missing required argument: {field}"),
                field,
            )
            .into());
        };

        let (groups, roles) = self.resolve_memberships(changes).await?;
        let spec = UserSpec {
            name: desired.name.clone(),
            password,
            full_name: desired.full_name.clone(),
            description: desired.desc.clone(),
            email: desired.email.clone(),
            authentication_type,
        };
        let reference = if self.check_mode {
            None
        } else {
            Some(self.api.create_user(&spec).await?)
        };

        let mut user = User {
            reference: reference.clone().unwrap_or_default(),
            name: spec.name.clone(),
            full_name: spec.full_name.clone().unwrap_or_default(),
            description: spec.description.clone().unwrap_or_default(),
            email: spec.email.clone().unwrap_or_default(),
            authentication_type: spec.authentication_type.clone(),
            groups: Vec::new(),
            roles: Vec::new(),
        };

        // The create call does not take groups or roles.
        let mut report = MemberReport::default();
        let target = reference.as_deref();
        self.apply_memberships(&mut user, target, Membership::Group, groups, &[], &mut report)
            .await?;
        self.apply_memberships(&mut user, target, Membership::Role, roles, &[], &mut report)
            .await?;

        let result = self.finish(
            ReconcileAction::Create,
            true,
            user_snapshot(&user),
            "user",
            &desired.name,
        );
        Ok(result.with_errors(report.errors))
    }

    async fn update_user(
        &self,
        mut user: User,
        changes: &UserChangeSet,
    ) -> Result<ReconciliationResult> {
        let (groups, roles) = self.resolve_memberships(changes).await?;
        let target = (!self.check_mode).then(|| user.reference.clone());
        let mut changed = false;

        if !changes.patch.is_empty() {
            if let Some(reference) = &target {
                self.api.update_user(reference, &changes.patch).await?;
            }
            apply_user_patch(&mut user, &changes.patch);
            changed = true;
        }

        let mut report = MemberReport::default();
        self.apply_memberships(
            &mut user,
            target.as_deref(),
            Membership::Group,
            groups,
            &changes.groups_to_remove,
            &mut report,
        )
        .await?;
        self.apply_memberships(
            &mut user,
            target.as_deref(),
            Membership::Role,
            roles,
            &changes.roles_to_remove,
            &mut report,
        )
        .await?;
        changed |= report.applied > 0;

        let name = user.name.clone();
        let result = self.finish(
            ReconcileAction::Update,
            changed,
            user_snapshot(&user),
            "user",
            &name,
        );
        Ok(result.with_errors(report.errors))
    }

    /// Looks up every group and role the user has to join.
    async fn resolve_memberships(
        &self,
        changes: &UserChangeSet,
    ) -> Result<(Vec<ObjectRef>, Vec<ObjectRef>)> {
        let mut groups = Vec::with_capacity(changes.groups_to_add.len());
        for name in &changes.groups_to_add {
            let group = self
                .api
                .find_group(name)
                .await?
                .ok_or_else(|| ApiError::not_found("group", name.as_str()))?;
            groups.push(ObjectRef {
                reference: group.reference,
                name: group.name,
            });
        }

        let mut roles = Vec::with_capacity(changes.roles_to_add.len());
        for name in &changes.roles_to_add {
            let role = self
                .api
                .find_role(name)
                .await?
                .ok_or_else(|| ApiError::not_found("role", name.as_str()))?;
            roles.push(role);
        }

        Ok((groups, roles))
    }

    /// Joins and leaves groups or roles one by one.
    ///
    /// `target` is the user reference, `None` in check mode.
    async fn apply_memberships(
        &self,
        user: &mut User,
        target: Option<&str>,
        kind: Membership,
        to_add: Vec<ObjectRef>,
        to_remove: &[String],
        report: &mut MemberReport,
    ) -> Result<()> {
        for object in to_add {
            if let Some(user_ref) = target
                && let Err(err) = self.set_membership(kind, true, user_ref, &object.reference).await
            {
                if !err.is_item_level() {
                    return Err(err);
                }
                let err = kind.failure("add", &user.name, &object.name, &err);
                warn!("{err}");
                report.push(&object.name, err.to_string());
                continue;
            }

            debug!("Added {} to {kind:?} {}", user.name, object.name);
            kind.list_mut(user).push(object);
            report.applied += 1;
        }

        for name in to_remove {
            let Some(object) = kind.list_mut(user).iter().find(|o| o.name == *name).cloned()
            else {
                continue;
            };

            if let Some(user_ref) = target
                && let Err(err) = self.set_membership(kind, false, user_ref, &object.reference).await
            {
                if !err.is_item_level() {
                    return Err(err);
                }
                let err = kind.failure("remove", &user.name, name, &err);
                warn!("{err}");
                report.push(name, err.to_string());
                continue;
            }

            debug!("Removed {} from {kind:?} {name}", user.name);
            kind.list_mut(user).retain(|o| o.reference != object.reference);
            report.applied += 1;
        }

        Ok(())
    }

    async fn set_membership(
        &self,
        kind: Membership,
        join: bool,
        user_ref: &str,
        object_ref: &str,
    ) -> Result<()> {
        match (kind, join) {
            (Membership::Group, true) => self.api.add_group_member(object_ref, user_ref).await,
            (Membership::Group, false) => self.api.remove_group_member(object_ref, user_ref).await,
            (Membership::Role, true) => self.api.add_user_role(user_ref, object_ref).await,
            (Membership::Role, false) => self.api.remove_user_role(user_ref, object_ref).await,
        }
    }

    /// Reconciles a DNS zone.
    ///
    /// With a nameserver the zone is looked up in that server's view;
    /// without one, in every view.
    ///
    /// # Errors
    ///
    /// Returns a server error if the nameserver is unknown, or any API
    /// failure while reading or applying.
    pub async fn reconcile_zone(&self, desired: &ZoneParams) -> Result<ReconciliationResult> {
        let view = match &desired.nameserver {
            Some(nameserver) => Some(self.reader.resolve_view(nameserver).await?),
            None => None,
        };

        let current = self.reader.read_zone(&desired.name, view.as_deref()).await?;
        let changes = self.diff_engine.diff_zone(desired, &current);
        let action =
            ReconcileAction::decide(desired.state, current.is_present(), !changes.is_empty());
        info!("{}", action.description("zone", &desired.name));

        let warnings: Vec<String> = changes
            .read_only
            .iter()
            .map(|d| format!("{} cannot be changed on an existing zone ({d})", d.field))
            .collect();
        for warning in &warnings {
            warn!("Zone {}: {warning}", desired.name);
        }

        let mut result = match (action, current) {
            (ReconcileAction::Create, _) => {
                let view = view.ok_or_else(|| {
                    ConfigError::validation(
                        "a nameserver is required to create a zone",
                        "nameserver",
                    )
                })?;
                if desired.servtype.needs_masters()
                    && desired.masters.as_deref().is_none_or(<[String]>::is_empty)
                {
                    return Err(ConfigError::validation(
                        format!(
                            "a {} zone needs at least one master",
                            desired.servtype.api_name().to_lowercase()
                        ),
                        "masters",
                    )
                    .into());
                }
                let spec = zone_spec(desired, view);
                let reference = if self.check_mode {
                    String::new()
                } else {
                    self.api.create_zone(&spec).await?
                };
                let snapshot = zone_snapshot(&created_zone(&spec, reference), &[])?;
                self.finish(action, true, snapshot, "zone", &desired.name)
            }
            (ReconcileAction::Update, Observed::Present(zone)) => {
                if !self.check_mode {
                    self.api.update_zone(&zone.reference, &changes.patch).await?;
                }
                let snapshot = zone_snapshot(&zone, &changes.patch)?;
                self.finish(action, true, snapshot, "zone", &desired.name)
            }
            (ReconcileAction::Delete, Observed::Present(zone)) => {
                if !self.check_mode {
                    self.api.delete_zone(&zone.reference).await?;
                }
                self.finish(action, true, Value::Null, "zone", &desired.name)
            }
            (_, current) => {
                let snapshot = match current.as_present() {
                    Some(zone) => zone_snapshot(zone, &[])?,
                    None => Value::Null,
                };
                self.finish(action, false, snapshot, "zone", &desired.name)
            }
        };

        result.diff = changes.details;
        result.warnings = warnings;
        Ok(result)
    }

    /// Reconciles a custom property definition.
    ///
    /// # Errors
    ///
    /// Returns any API failure while reading or applying.
    pub async fn reconcile_property(
        &self,
        desired: &PropertyParams,
    ) -> Result<ReconciliationResult> {
        let current = self.reader.read_property(desired.dest, &desired.name).await?;
        let changes = self.diff_engine.diff_property(desired, &current);
        let action =
            ReconcileAction::decide(desired.state, current.is_present(), !changes.is_empty());
        let kind = ResourceKind::PropertyDefinition.to_string();
        info!("{}", action.description(&kind, &desired.name));

        let definition = desired_definition(desired);
        let mut result = match action {
            ReconcileAction::Create => {
                if !self.check_mode {
                    self.api
                        .create_property_definition(desired.dest, &definition)
                        .await?;
                }
                self.finish(action, true, snapshot(&definition)?, &kind, &desired.name)
            }
            ReconcileAction::Update => {
                if !self.check_mode {
                    self.api
                        .update_property_definition(
                            desired.dest,
                            &definition,
                            desired.updateexisting,
                        )
                        .await?;
                }
                self.finish(action, true, snapshot(&definition)?, &kind, &desired.name)
            }
            ReconcileAction::Delete => {
                if !self.check_mode {
                    self.api
                        .delete_property_definition(desired.dest, &desired.name)
                        .await?;
                }
                self.finish(action, true, Value::Null, &kind, &desired.name)
            }
            ReconcileAction::Noop => {
                let snapshot = match current.as_present() {
                    Some(existing) => snapshot(existing)?,
                    None => Value::Null,
                };
                self.finish(action, false, snapshot, &kind, &desired.name)
            }
        };

        result.diff = changes.details;
        Ok(result)
    }

    fn finish(
        &self,
        action: ReconcileAction,
        changed: bool,
        resource: Value,
        kind: &str,
        name: &str,
    ) -> ReconciliationResult {
        let planned = self.check_mode && action.is_mutation();
        let mut message = action.description(kind, name);
        if planned {
            message.push_str(" (check mode)");
        }
        ReconciliationResult {
            changed,
            action,
            planned,
            resource,
            errors: vec![],
            warnings: vec![],
            diff: vec![],
            message,
        }
    }
}

impl MemberReport {
    fn push(&mut self, item: &str, message: String) {
        self.errors.push(ItemError {
            item: item.to_string(),
            message,
        });
    }
}

impl Membership {
    fn list_mut(self, user: &mut User) -> &mut Vec<ObjectRef> {
        match self {
            Self::Group => &mut user.groups,
            Self::Role => &mut user.roles,
        }
    }

    fn failure(self, operation: &str, user: &str, name: &str, err: &MicetroError) -> ReconcileError {
        match self {
            Self::Group => member_failure(operation, name, user, err),
            Self::Role => ReconcileError::RoleUpdateFailed {
                operation: operation.to_string(),
                role: name.to_string(),
                user: user.to_string(),
                reason: err.to_string(),
            },
        }
    }
}

impl ReconciliationResult {
    /// Attaches per-item failures and notes them in the message.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ItemError>) -> Self {
        if !errors.is_empty() {
            self.message = format!("{} with {} failed item(s)", self.message, errors.len());
        }
        self.errors = errors;
        self
    }

    /// Returns true if some items failed.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

fn member_failure(
    operation: &str,
    group: &str,
    user: &str,
    err: &MicetroError,
) -> ReconcileError {
    ReconcileError::MemberUpdateFailed {
        operation: operation.to_string(),
        group: group.to_string(),
        user: user.to_string(),
        reason: err.to_string(),
    }
}

fn group_snapshot(group: &ObservedGroup) -> Value {
    json!({
        "ref": group.reference,
        "name": group.name,
        "desc": group.description,
        "users": group.members.keys().collect::<Vec<_>>(),
    })
}

/// Renders a user in parameter naming. The password is never included.
fn user_snapshot(user: &User) -> Value {
    json!({
        "ref": user.reference,
        "name": user.name,
        "full_name": user.full_name,
        "desc": user.description,
        "email": user.email,
        "authentication_type": user.authentication_type,
        "groups": user.group_names(),
        "roles": user.role_names(),
    })
}

fn apply_user_patch(user: &mut User, patch: &[PropertyValue]) {
    for property in patch {
        let value = property
            .value
            .as_str()
            .map_or_else(|| property.value.to_string(), String::from);
        match property.name.as_str() {
            "fullName" => user.full_name = value,
            "description" => user.description = value,
            "email" => user.email = value,
            "authenticationType" => user.authentication_type = value,
            _ => {}
        }
    }
}

fn zone_spec(desired: &ZoneParams, view: String) -> ZoneSpec {
    ZoneSpec {
        name: desired.name.clone(),
        dns_view_ref: view,
        dynamic: desired.dynamic.unwrap_or_default(),
        authority: desired.authority.clone(),
        zone_type: desired.servtype.api_name().to_string(),
        ad_integrated: desired.adintegrated,
        ad_replication_type: desired.adreplicationtype.clone(),
        ad_partition: desired.adpartition.clone(),
        custom_properties: desired
            .customproperties
            .iter()
            .map(|(k, v)| PropertyValue::new(k.as_str(), v.as_str()))
            .collect(),
        masters: if desired.servtype.needs_masters() {
            desired.masters.clone().unwrap_or_default()
        } else {
            Vec::new()
        },
    }
}

fn created_zone(spec: &ZoneSpec, reference: String) -> Zone {
    Zone {
        reference,
        name: spec.name.clone(),
        zone_type: spec.zone_type.clone(),
        dynamic: spec.dynamic,
        authority: spec.authority.clone(),
        masters: spec.masters.clone(),
        ad_integrated: spec.ad_integrated,
        ad_replication_type: spec.ad_replication_type.clone(),
        ad_partition: spec.ad_partition.clone(),
        custom_properties: spec
            .custom_properties
            .iter()
            .map(|p| {
                let value = p.value.as_str().map_or_else(|| p.value.to_string(), String::from);
                (p.name.clone(), value)
            })
            .collect(),
    }
}

fn snapshot<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| MicetroError::internal(format!("Failed to encode resource: {e}")))
}

/// Renders a zone with a patch applied on top.
fn zone_snapshot(zone: &Zone, patch: &[PropertyValue]) -> Result<Value> {
    let mut rendered = snapshot(zone)?;
    if let Some(object) = rendered.as_object_mut() {
        for property in patch {
            if ZONE_FIELDS.contains(&property.name.as_str()) {
                object.insert(property.name.clone(), property.value.clone());
            } else if let Some(custom) = object
                .entry("customProperties")
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
            {
                custom.insert(property.name.clone(), property.value.clone());
            }
        }
    }
    Ok(rendered)
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.item, self.message)
    }
}

impl std::fmt::Display for ReconciliationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} (changed={})", self.message, self.changed)?;
        for detail in &self.diff {
            writeln!(f, "  {detail}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {warning}")?;
        }
        for error in &self.errors {
            writeln!(f, "  error: {error}")?;
        }
        Ok(())
    }
}

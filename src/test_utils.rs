//! Test doubles for the Micetro API.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::api::{
    Group, MicetroApi, ObjectRef, PropertyDefinition, PropertyValue, User, UserRef, UserSpec,
    Zone, ZoneSpec,
};
use crate::config::PropertyDest;
use crate::error::{ApiError, Result};

/// In-memory Micetro server that records every mutating call.
#[derive(Default)]
pub struct FakeMicetro {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    next_id: u32,
    groups: BTreeMap<String, Group>,
    members: BTreeMap<String, BTreeSet<String>>,
    users: BTreeMap<String, User>,
    roles: BTreeMap<String, String>,
    user_roles: BTreeMap<String, BTreeSet<String>>,
    views: BTreeMap<String, String>,
    zones: BTreeMap<String, (String, Zone)>,
    definitions: BTreeMap<(String, String), PropertyDefinition>,
    failing_users: BTreeSet<String>,
    failing_zone_updates: bool,
    mutations: Vec<String>,
}

impl FakeMicetro {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let reference = format!("Users/{}", state.next_id());
            state.users.insert(
                name.to_string(),
                User {
                    reference,
                    name: name.to_string(),
                    full_name: String::new(),
                    description: String::new(),
                    email: String::new(),
                    authentication_type: String::new(),
                    groups: Vec::new(),
                    roles: Vec::new(),
                },
            );
        }
        self
    }

    pub fn with_group(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let reference = format!("Groups/{}", state.next_id());
            state.insert_group(&reference, name, "");
        }
        self
    }

    pub fn with_role(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let reference = format!("Roles/{}", state.next_id());
            state.roles.insert(name.to_string(), reference);
        }
        self
    }

    pub fn with_nameserver(self, nameserver: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id();
            state
                .views
                .insert(nameserver.to_string(), format!("DNSViews/{id}"));
        }
        self
    }

    /// Makes adding this user to any group fail with a server error.
    pub fn with_failing_member(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let reference = state.users[name].reference.clone();
            state.failing_users.insert(reference);
        }
        self
    }

    /// Makes every zone update fail with a server error.
    pub fn with_failing_zone_updates(self) -> Self {
        self.state.lock().unwrap().failing_zone_updates = true;
        self
    }

    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn member_names(&self, group: &str) -> Option<Vec<String>> {
        let state = self.state.lock().unwrap();
        let group = state.groups.values().find(|g| g.name == group)?;
        let refs = state.members.get(&group.reference)?;
        Some(
            state
                .users
                .values()
                .filter(|u| refs.contains(&u.reference))
                .map(|u| u.name.clone())
                .collect(),
        )
    }

    /// Returns a user as the server would report it.
    pub fn user(&self, name: &str) -> Option<User> {
        self.state.lock().unwrap().user_view(name)
    }

    pub fn zone(&self, name: &str) -> Option<Zone> {
        let state = self.state.lock().unwrap();
        state
            .zones
            .values()
            .find(|(_, z)| z.has_name(name))
            .map(|(_, z)| z.clone())
    }

    pub fn definition(&self, dest: PropertyDest, name: &str) -> Option<PropertyDefinition> {
        let state = self.state.lock().unwrap();
        state
            .definitions
            .get(&(dest.collection().to_string(), name.to_string()))
            .cloned()
    }
}

impl FakeState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_group(&mut self, reference: &str, name: &str, description: &str) {
        self.groups.insert(
            reference.to_string(),
            Group {
                reference: reference.to_string(),
                name: name.to_string(),
                description: description.to_string(),
            },
        );
        self.members.insert(reference.to_string(), BTreeSet::new());
    }

    fn user_by_ref(&self, reference: &str) -> Option<&User> {
        self.users.values().find(|u| u.reference == reference)
    }

    fn user_by_ref_mut(&mut self, reference: &str) -> Option<&mut User> {
        self.users.values_mut().find(|u| u.reference == reference)
    }

    /// Fills in the groups and roles of a stored user.
    fn user_view(&self, name: &str) -> Option<User> {
        let mut user = self.users.get(name)?.clone();
        user.groups = self
            .members
            .iter()
            .filter(|(_, refs)| refs.contains(&user.reference))
            .filter_map(|(group_ref, _)| self.groups.get(group_ref))
            .map(|g| ObjectRef {
                reference: g.reference.clone(),
                name: g.name.clone(),
            })
            .collect();
        let assigned = self.user_roles.get(&user.reference);
        user.roles = self
            .roles
            .iter()
            .filter(|(_, r)| assigned.is_some_and(|a| a.contains(*r)))
            .map(|(name, reference)| ObjectRef {
                reference: reference.clone(),
                name: name.clone(),
            })
            .collect();
        Some(user)
    }
}

fn text(value: &Value) -> String {
    value.as_str().map_or_else(|| value.to_string(), String::from)
}

#[async_trait]
impl MicetroApi for FakeMicetro {
    async fn find_group(&self, name: &str) -> Result<Option<Group>> {
        let state = self.state.lock().unwrap();
        Ok(state.groups.values().find(|g| g.name == name).cloned())
    }

    async fn group_members(&self, group_ref: &str) -> Result<Vec<UserRef>> {
        let state = self.state.lock().unwrap();
        let refs = state.members.get(group_ref).cloned().unwrap_or_default();
        Ok(refs
            .into_iter()
            .filter_map(|r| {
                state.user_by_ref(&r).map(|user| UserRef {
                    reference: r.clone(),
                    name: user.name.clone(),
                })
            })
            .collect())
    }

    async fn create_group(&self, name: &str, description: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let reference = format!("Groups/{}", state.next_id());
        state.insert_group(&reference, name, description);
        state.mutations.push(format!("create_group {name}"));
        Ok(reference)
    }

    async fn update_group(&self, group_ref: &str, properties: &[PropertyValue]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(group) = state.groups.get_mut(group_ref) {
            for property in properties {
                if property.name == "description" {
                    group.description = text(&property.value);
                }
            }
        }
        state.mutations.push(format!("update_group {group_ref}"));
        Ok(())
    }

    async fn delete_group(&self, group_ref: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.groups.remove(group_ref);
        state.members.remove(group_ref);
        state.mutations.push(format!("delete_group {group_ref}"));
        Ok(())
    }

    async fn find_user(&self, name: &str) -> Result<Option<User>> {
        Ok(self.user(name))
    }

    async fn create_user(&self, spec: &UserSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let reference = format!("Users/{}", state.next_id());
        state.users.insert(
            spec.name.clone(),
            User {
                reference: reference.clone(),
                name: spec.name.clone(),
                full_name: spec.full_name.clone().unwrap_or_default(),
                description: spec.description.clone().unwrap_or_default(),
                email: spec.email.clone().unwrap_or_default(),
                authentication_type: spec.authentication_type.clone(),
                groups: Vec::new(),
                roles: Vec::new(),
            },
        );
        state.mutations.push(format!("create_user {}", spec.name));
        Ok(reference)
    }

    async fn update_user(&self, user_ref: &str, properties: &[PropertyValue]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.user_by_ref_mut(user_ref) {
            for property in properties {
                let value = text(&property.value);
                match property.name.as_str() {
                    "fullName" => user.full_name = value,
                    "description" => user.description = value,
                    "email" => user.email = value,
                    "authenticationType" => user.authentication_type = value,
                    _ => {}
                }
            }
        }
        state.mutations.push(format!("update_user {user_ref}"));
        Ok(())
    }

    async fn delete_user(&self, user_ref: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.users.retain(|_, u| u.reference != user_ref);
        for refs in state.members.values_mut() {
            refs.remove(user_ref);
        }
        state.user_roles.remove(user_ref);
        state.mutations.push(format!("delete_user {user_ref}"));
        Ok(())
    }

    async fn add_group_member(&self, group_ref: &str, user_ref: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_users.contains(user_ref) {
            return Err(ApiError::server(500, "Internal server error").into());
        }
        state
            .members
            .entry(group_ref.to_string())
            .or_default()
            .insert(user_ref.to_string());
        state
            .mutations
            .push(format!("add_member {group_ref} {user_ref}"));
        Ok(())
    }

    async fn remove_group_member(&self, group_ref: &str, user_ref: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(members) = state.members.get_mut(group_ref) {
            members.remove(user_ref);
        }
        state
            .mutations
            .push(format!("remove_member {group_ref} {user_ref}"));
        Ok(())
    }

    async fn find_role(&self, name: &str) -> Result<Option<ObjectRef>> {
        let state = self.state.lock().unwrap();
        Ok(state.roles.get(name).map(|r| ObjectRef {
            reference: r.clone(),
            name: name.to_string(),
        }))
    }

    async fn add_user_role(&self, user_ref: &str, role_ref: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .user_roles
            .entry(user_ref.to_string())
            .or_default()
            .insert(role_ref.to_string());
        state
            .mutations
            .push(format!("add_role {user_ref} {role_ref}"));
        Ok(())
    }

    async fn remove_user_role(&self, user_ref: &str, role_ref: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(roles) = state.user_roles.get_mut(user_ref) {
            roles.remove(role_ref);
        }
        state
            .mutations
            .push(format!("remove_role {user_ref} {role_ref}"));
        Ok(())
    }

    async fn find_dns_view(&self, nameserver: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.views.get(nameserver).cloned())
    }

    async fn find_zone(&self, name: &str, view_ref: Option<&str>) -> Result<Option<Zone>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .zones
            .values()
            .find(|(view, zone)| zone.has_name(name) && view_ref.is_none_or(|v| v == view))
            .map(|(_, zone)| zone.clone()))
    }

    async fn create_zone(&self, spec: &ZoneSpec) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let reference = format!("DNSZones/{}", state.next_id());
        let zone = Zone {
            reference: reference.clone(),
            name: format!("{}.", spec.name.trim_end_matches('.')),
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
                .map(|p| (p.name.clone(), text(&p.value)))
                .collect(),
        };
        state
            .zones
            .insert(reference.clone(), (spec.dns_view_ref.clone(), zone));
        state.mutations.push(format!("create_zone {}", spec.name));
        Ok(reference)
    }

    async fn update_zone(&self, zone_ref: &str, properties: &[PropertyValue]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_zone_updates {
            return Err(ApiError::server(500, "Internal server error").into());
        }
        if let Some((_, zone)) = state.zones.get_mut(zone_ref) {
            for property in properties {
                let value = &property.value;
                match property.name.as_str() {
                    "type" => zone.zone_type = text(value),
                    "masters" => {
                        zone.masters = value
                            .as_array()
                            .map(|a| a.iter().map(text).collect())
                            .unwrap_or_default();
                    }
                    "dynamic" => zone.dynamic = value.as_bool().unwrap_or_default(),
                    "adIntegrated" => zone.ad_integrated = value.as_bool(),
                    "adReplicationType" => zone.ad_replication_type = Some(text(value)),
                    "adPartition" => zone.ad_partition = Some(text(value)),
                    other => {
                        zone.custom_properties.insert(other.to_string(), text(value));
                    }
                }
            }
        }
        state.mutations.push(format!("update_zone {zone_ref}"));
        Ok(())
    }

    async fn delete_zone(&self, zone_ref: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.zones.remove(zone_ref);
        state.mutations.push(format!("delete_zone {zone_ref}"));
        Ok(())
    }

    async fn find_property_definition(
        &self,
        dest: PropertyDest,
        name: &str,
    ) -> Result<Option<PropertyDefinition>> {
        Ok(self.definition(dest, name))
    }

    async fn create_property_definition(
        &self,
        dest: PropertyDest,
        definition: &PropertyDefinition,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.definitions.insert(
            (dest.collection().to_string(), definition.name.clone()),
            definition.clone(),
        );
        state
            .mutations
            .push(format!("create_property {}", definition.name));
        Ok(())
    }

    async fn update_property_definition(
        &self,
        dest: PropertyDest,
        definition: &PropertyDefinition,
        update_existing: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.definitions.insert(
            (dest.collection().to_string(), definition.name.clone()),
            definition.clone(),
        );
        state.mutations.push(format!(
            "update_property {} {update_existing}",
            definition.name
        ));
        Ok(())
    }

    async fn delete_property_definition(&self, dest: PropertyDest, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .definitions
            .remove(&(dest.collection().to_string(), name.to_string()));
        state.mutations.push(format!("delete_property {name}"));
        Ok(())
    }
}

/// Strict mock: any call without an expectation panics.
pub mod mock {
    #![allow(dead_code)]

    use async_trait::async_trait;
    use mockall::mock;

    use crate::api::{
        Group, MicetroApi, ObjectRef, PropertyDefinition, PropertyValue, User, UserRef, UserSpec,
        Zone, ZoneSpec,
    };
    use crate::config::PropertyDest;
    use crate::error::Result;

    mock! {
        pub Api {}

        #[async_trait]
        impl MicetroApi for Api {
            async fn find_group(&self, name: &str) -> Result<Option<Group>>;
            async fn group_members(&self, group_ref: &str) -> Result<Vec<UserRef>>;
            async fn create_group(&self, name: &str, description: &str) -> Result<String>;
            async fn update_group(&self, group_ref: &str, properties: &[PropertyValue]) -> Result<()>;
            async fn delete_group(&self, group_ref: &str) -> Result<()>;
            async fn find_user(&self, name: &str) -> Result<Option<User>>;
            async fn create_user(&self, spec: &UserSpec) -> Result<String>;
            async fn update_user(&self, user_ref: &str, properties: &[PropertyValue]) -> Result<()>;
            async fn delete_user(&self, user_ref: &str) -> Result<()>;
            async fn add_group_member(&self, group_ref: &str, user_ref: &str) -> Result<()>;
            async fn remove_group_member(&self, group_ref: &str, user_ref: &str) -> Result<()>;
            async fn find_role(&self, name: &str) -> Result<Option<ObjectRef>>;
            async fn add_user_role(&self, user_ref: &str, role_ref: &str) -> Result<()>;
            async fn remove_user_role(&self, user_ref: &str, role_ref: &str) -> Result<()>;
            async fn find_dns_view(&self, nameserver: &str) -> Result<Option<String>>;
            async fn find_zone<'a, 'b, 'c>(&'a self, name: &'b str, view_ref: Option<&'c str>) -> Result<Option<Zone>>;
            async fn create_zone(&self, spec: &ZoneSpec) -> Result<String>;
            async fn update_zone(&self, zone_ref: &str, properties: &[PropertyValue]) -> Result<()>;
            async fn delete_zone(&self, zone_ref: &str) -> Result<()>;
            async fn find_property_definition(
                &self,
                dest: PropertyDest,
                name: &str,
            ) -> Result<Option<PropertyDefinition>>;
            async fn create_property_definition(
                &self,
                dest: PropertyDest,
                definition: &PropertyDefinition,
            ) -> Result<()>;
            async fn update_property_definition(
                &self,
                dest: PropertyDest,
                definition: &PropertyDefinition,
                update_existing: bool,
            ) -> Result<()>;
            async fn delete_property_definition(&self, dest: PropertyDest, name: &str) -> Result<()>;
        }
    }
}

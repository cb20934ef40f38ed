//! Micetro API integration module.
//!
//! This module provides the HTTP client for the Micetro REST API, the
//! [`MicetroApi`] seam the reconciler is written against, and the
//! side-effect-free resource reader.

mod client;
mod reader;
pub mod types;

use async_trait::async_trait;

use crate::config::PropertyDest;
use crate::error::Result;

pub use client::MicetroClient;
pub use reader::{Observed, ObservedGroup, ResourceReader};
pub use types::{
    Group, ObjectRef, PropertyDefinition, PropertyValue, ResourceKind, User, UserRef, UserSpec,
    Zone, ZoneSpec,
};

/// Typed operations on the Micetro server.
///
/// Lookups return `Ok(None)` when the object does not exist. Mutations
/// take the server reference of the object (e.g. `Groups/12`).
#[async_trait]
pub trait MicetroApi: Send + Sync {
    /// Finds a group by exact name.
    async fn find_group(&self, name: &str) -> Result<Option<Group>>;

    /// Lists the members of a group.
    async fn group_members(&self, group_ref: &str) -> Result<Vec<UserRef>>;

    /// Creates a group without members and returns its reference.
    async fn create_group(&self, name: &str, description: &str) -> Result<String>;

    /// Changes group properties.
    async fn update_group(&self, group_ref: &str, properties: &[PropertyValue]) -> Result<()>;

    /// Deletes a group.
    async fn delete_group(&self, group_ref: &str) -> Result<()>;

    /// Finds a user by exact name, with its groups and roles.
    async fn find_user(&self, name: &str) -> Result<Option<User>>;

    /// Creates a user without groups or roles and returns its reference.
    async fn create_user(&self, spec: &UserSpec) -> Result<String>;

    /// Changes user properties.
    async fn update_user(&self, user_ref: &str, properties: &[PropertyValue]) -> Result<()>;

    /// Deletes a user.
    async fn delete_user(&self, user_ref: &str) -> Result<()>;

    /// Adds a user to a group.
    async fn add_group_member(&self, group_ref: &str, user_ref: &str) -> Result<()>;

    /// Removes a user from a group.
    async fn remove_group_member(&self, group_ref: &str, user_ref: &str) -> Result<()>;

    /// Finds a role by exact name.
    async fn find_role(&self, name: &str) -> Result<Option<ObjectRef>>;

    /// Assigns a role to a user.
    async fn add_user_role(&self, user_ref: &str, role_ref: &str) -> Result<()>;

    /// Revokes a role from a user.
    async fn remove_user_role(&self, user_ref: &str, role_ref: &str) -> Result<()>;

    /// Finds the DNS view a nameserver serves zones from.
    async fn find_dns_view(&self, nameserver: &str) -> Result<Option<String>>;

    /// Finds a zone by name, optionally restricted to one view.
    async fn find_zone(&self, name: &str, view_ref: Option<&str>) -> Result<Option<Zone>>;

    /// Creates a zone and returns its reference.
    async fn create_zone(&self, spec: &ZoneSpec) -> Result<String>;

    /// Changes zone properties.
    async fn update_zone(&self, zone_ref: &str, properties: &[PropertyValue]) -> Result<()>;

    /// Deletes a zone.
    async fn delete_zone(&self, zone_ref: &str) -> Result<()>;

    /// Finds a custom property definition.
    async fn find_property_definition(
        &self,
        dest: PropertyDest,
        name: &str,
    ) -> Result<Option<PropertyDefinition>>;

    /// Creates a custom property definition.
    async fn create_property_definition(
        &self,
        dest: PropertyDest,
        definition: &PropertyDefinition,
    ) -> Result<()>;

    /// Replaces a custom property definition.
    async fn update_property_definition(
        &self,
        dest: PropertyDest,
        definition: &PropertyDefinition,
        update_existing: bool,
    ) -> Result<()>;

    /// Deletes a custom property definition.
    async fn delete_property_definition(&self, dest: PropertyDest, name: &str) -> Result<()>;
}

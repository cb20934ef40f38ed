//! Side-effect-free reads of current server state.
//!
//! Every read maps "does not exist" to [`Observed::Absent`] instead of an
//! error. Results are never cached; each invocation reads afresh.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::PropertyDest;
use crate::error::{ApiError, Result};

use super::MicetroApi;
use super::types::{PropertyDefinition, User, Zone};

/// Current state of a resource on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed<T> {
    /// The resource exists.
    Present(T),
    /// The resource does not exist.
    Absent,
}

/// A group together with its current members.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ObservedGroup {
    /// Server reference.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Group name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Members, user name to user reference.
    pub members: BTreeMap<String, String>,
}

/// Reader for current resource state.
pub struct ResourceReader<'a, A: MicetroApi + ?Sized> {
    api: &'a A,
}

impl<T> Observed<T> {
    /// Returns true if the resource exists.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Returns the resource, if present.
    #[must_use]
    pub const fn as_present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Observed<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

impl<'a, A: MicetroApi + ?Sized> ResourceReader<'a, A> {
    /// Creates a reader on top of an API implementation.
    #[must_use]
    pub const fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Reads a group and its members.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be queried.
    pub async fn read_group(&self, name: &str) -> Result<Observed<ObservedGroup>> {
        let Some(group) = self.api.find_group(name).await? else {
            debug!("Group {name} is absent");
            return Ok(Observed::Absent);
        };

        let members = self
            .api
            .group_members(&group.reference)
            .await?
            .into_iter()
            .map(|u| (u.name, u.reference))
            .collect::<BTreeMap<_, _>>();

        debug!("Group {name} has {} members", members.len());
        Ok(Observed::Present(ObservedGroup {
            reference: group.reference,
            name: group.name,
            description: group.description,
            members,
        }))
    }

    /// Reads a user with its groups and roles.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be queried.
    pub async fn read_user(&self, name: &str) -> Result<Observed<User>> {
        let user = self.api.find_user(name).await?;
        debug!("User {name} present: {}", user.is_some());
        Ok(user.into())
    }

    /// Resolves the DNS view a nameserver serves zones from.
    ///
    /// # Errors
    ///
    /// Returns a server error if the nameserver is unknown.
    pub async fn resolve_view(&self, nameserver: &str) -> Result<String> {
        self.api.find_dns_view(nameserver).await?.ok_or_else(|| {
            ApiError::server(404, format!("nameserver does not exist: {nameserver}")).into()
        })
    }

    /// Reads a zone, optionally within a single view.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be queried.
    pub async fn read_zone(&self, name: &str, view_ref: Option<&str>) -> Result<Observed<Zone>> {
        let zone = self.api.find_zone(name, view_ref).await?;
        debug!("Zone {name} present: {}", zone.is_some());
        Ok(zone.into())
    }

    /// Reads a custom property definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be queried.
    pub async fn read_property(
        &self,
        dest: PropertyDest,
        name: &str,
    ) -> Result<Observed<PropertyDefinition>> {
        Ok(self.api.find_property_definition(dest, name).await?.into())
    }
}

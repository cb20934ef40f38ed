//! Micetro REST API types.
//!
//! Wire representations of the objects the reconciler reads and writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kinds of objects addressed through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// User groups.
    Group,
    /// User accounts.
    User,
    /// User roles.
    Role,
    /// DNS views.
    DnsView,
    /// DNS zones.
    Zone,
    /// Custom property definitions.
    PropertyDefinition,
}

/// Envelope around an API error response.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    /// Error details.
    pub error: ErrorBody,
}

/// Error details returned by the server.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Numeric error code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Human-readable message.
    pub message: String,
}

/// A named property change in an update call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyValue {
    /// Property name as the API spells it.
    pub name: String,
    /// New value.
    pub value: serde_json::Value,
}

/// A user group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Server reference.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Group name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// Reference to a user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    /// Server reference.
    #[serde(rename = "ref")]
    pub reference: String,
    /// User name.
    pub name: String,
}

/// Reference to a group or role as embedded in a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectRef {
    /// Server reference.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Object name.
    #[serde(default)]
    pub name: String,
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server reference, e.g. `Users/31`.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Login name.
    pub name: String,
    /// Full name.
    #[serde(default)]
    pub full_name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Authentication type (`Internal`, `AD`, ...).
    #[serde(default)]
    pub authentication_type: String,
    /// Groups the user belongs to.
    #[serde(default)]
    pub groups: Vec<ObjectRef>,
    /// Roles assigned to the user.
    #[serde(default)]
    pub roles: Vec<ObjectRef>,
}

/// Everything needed to create a user.
///
/// Groups and roles are assigned with separate calls after creation.
#[derive(Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    /// Login name.
    pub name: String,
    /// Plain-text password.
    pub password: String,
    /// Full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Authentication type as the API spells it.
    pub authentication_type: String,
}

/// A DNS view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DnsView {
    /// Server reference, e.g. `DNSViews/3`.
    #[serde(rename = "ref")]
    pub reference: String,
    /// View name (empty for the default view).
    #[serde(default)]
    pub name: String,
}

/// A DNS zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Server reference, e.g. `DNSZones/42`.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Zone name.
    pub name: String,
    /// Server type, capitalised (`Master`, `Slave`, ...).
    #[serde(rename = "type", default)]
    pub zone_type: String,
    /// Dynamic DNS zone.
    #[serde(default)]
    pub dynamic: bool,
    /// Authority server.
    #[serde(default)]
    pub authority: Option<String>,
    /// Master server addresses.
    #[serde(default)]
    pub masters: Vec<String>,
    /// Active Directory integration.
    #[serde(default)]
    pub ad_integrated: Option<bool>,
    /// Active Directory replication type.
    #[serde(default)]
    pub ad_replication_type: Option<String>,
    /// Active Directory partition.
    #[serde(default)]
    pub ad_partition: Option<String>,
    /// Custom property values.
    #[serde(default)]
    pub custom_properties: BTreeMap<String, String>,
}

/// Everything needed to create a zone.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSpec {
    /// Zone name.
    pub name: String,
    /// View the zone is created in.
    pub dns_view_ref: String,
    /// Dynamic DNS zone.
    pub dynamic: bool,
    /// Authority server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    /// Server type, capitalised.
    #[serde(rename = "type")]
    pub zone_type: String,
    /// Active Directory integration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_integrated: Option<bool>,
    /// Active Directory replication type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_replication_type: Option<String>,
    /// Active Directory partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_partition: Option<String>,
    /// Custom property values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_properties: Vec<PropertyValue>,
    /// Master servers; sent next to the zone rather than inside it.
    #[serde(skip)]
    pub masters: Vec<String>,
}

/// A custom property definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct PropertyDefinition {
    /// Property name.
    pub name: String,
    /// API type name (`String`, `Boolean`, `IPAddress`, `Integer`).
    #[serde(rename = "type")]
    pub property_type: String,
    /// System defined.
    #[serde(default)]
    pub system: bool,
    /// Value is mandatory.
    #[serde(default)]
    pub mandatory: bool,
    /// Read only.
    #[serde(default)]
    pub read_only: bool,
    /// Multiline.
    #[serde(default)]
    pub multi_line: bool,
    /// Default value.
    #[serde(default)]
    pub default_value: String,
    /// Predefined selection values.
    #[serde(default)]
    pub list_items: Vec<String>,
    /// Associated cloud tags.
    #[serde(default)]
    pub cloud_tags: Vec<String>,
}

impl ResourceKind {
    /// Returns the API collection path.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Group => "Groups",
            Self::User => "Users",
            Self::Role => "Roles",
            Self::DnsView => "DNSViews",
            Self::Zone => "DNSZones",
            Self::PropertyDefinition => "PropertyDefinitions",
        }
    }

    /// Returns the key holding the list in a collection response.
    #[must_use]
    pub const fn list_key(self) -> &'static str {
        match self {
            Self::Group => "groups",
            Self::User => "users",
            Self::Role => "roles",
            Self::DnsView => "dnsViews",
            Self::Zone => "dnsZones",
            Self::PropertyDefinition => "propertyDefinitions",
        }
    }

    /// Returns the key wrapping a single object in request and response bodies.
    #[must_use]
    pub const fn item_key(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::User => "user",
            Self::Role => "role",
            Self::DnsView => "dnsView",
            Self::Zone => "dnsZone",
            Self::PropertyDefinition => "propertyDefinition",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Group => "group",
            Self::User => "user",
            Self::Role => "role",
            Self::DnsView => "DNS view",
            Self::Zone => "zone",
            Self::PropertyDefinition => "property definition",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSpec")
            .field("name", &self.name)
            .field("password", &"********")
            .field("full_name", &self.full_name)
            .field("description", &self.description)
            .field("email", &self.email)
            .field("authentication_type", &self.authentication_type)
            .finish()
    }
}

impl User {
    /// Returns the names of the user's groups.
    #[must_use]
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// Returns the names of the user's roles.
    #[must_use]
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }
}

impl PropertyValue {
    /// Creates a property change.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Zone {
    /// Returns true if this zone has the given name.
    ///
    /// Zone names compare case-insensitively and ignore a trailing dot.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        zone_names_equal(&self.name, name)
    }
}

/// Compares two DNS zone names.
#[must_use]
pub fn zone_names_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

//! Module parameter types.
//!
//! These structs map one-to-one to the parameters a caller supplies for a
//! group, user, zone or property definition, and fully describe the
//! desired state of that resource.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::provider::ProviderConfig;

/// Desired existence of a resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// The resource should exist with the given attributes.
    #[default]
    Present,
    /// The resource should not exist.
    Absent,
}

/// Parameters of the `group` module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupParams {
    /// Group name (unique key).
    pub name: String,
    /// Group description.
    #[serde(default)]
    pub desc: Option<String>,
    /// Desired existence.
    #[serde(default)]
    pub state: DesiredState,
    /// Member user names. `None` leaves membership untouched.
    #[serde(default)]
    pub users: Option<Vec<String>>,
}

/// When a user's password is sent to the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePassword {
    /// Only when the user is created. The stored password cannot be read back.
    #[default]
    OnCreate,
    /// On every run; the user is reported as changed each time.
    Always,
}

/// Parameters of the `user` module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserParams {
    /// Login name (unique key).
    #[serde(alias = "username", alias = "user")]
    pub name: String,
    /// Desired existence.
    #[serde(default)]
    pub state: DesiredState,
    /// Plain-text password; required to create the user.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Password update policy for existing users.
    #[serde(default)]
    pub update_password: UpdatePassword,
    /// Full name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Description.
    #[serde(default, alias = "descr")]
    pub desc: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Authentication type, e.g. `internal` or `AD`; required to create the user.
    #[serde(default)]
    pub authentication_type: Option<String>,
    /// Group names. `None` leaves group membership untouched.
    #[serde(default)]
    pub groups: Option<Vec<String>>,
    /// Role names. `None` leaves role assignments untouched.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// DNS server type of a zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    /// Master (primary) zone.
    #[default]
    #[serde(alias = "Master")]
    Master,
    /// Slave (secondary) zone.
    #[serde(alias = "Slave")]
    Slave,
    /// Stub zone.
    #[serde(alias = "Stub")]
    Stub,
    /// Forward zone.
    #[serde(alias = "Forward")]
    Forward,
}

/// Parameters of the `zone` module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneParams {
    /// Zone name.
    pub name: String,
    /// Desired existence.
    #[serde(default)]
    pub state: DesiredState,
    /// DNS server whose view holds the zone.
    #[serde(default)]
    pub nameserver: Option<String>,
    /// Authority server, or `[Active Directory]`.
    #[serde(default)]
    pub authority: Option<String>,
    /// Server type.
    #[serde(default)]
    pub servtype: ServerType,
    /// Dynamic DNS zone.
    #[serde(default)]
    pub dynamic: Option<bool>,
    /// Master server addresses for non-master zones.
    #[serde(default)]
    pub masters: Option<Vec<String>>,
    /// Active Directory integration.
    #[serde(default)]
    pub adintegrated: Option<bool>,
    /// Active Directory replication type.
    #[serde(default)]
    pub adreplicationtype: Option<String>,
    /// Active Directory partition.
    #[serde(default)]
    pub adpartition: Option<String>,
    /// Custom properties; the definitions must already exist.
    #[serde(default, deserialize_with = "scalar_map")]
    pub customproperties: BTreeMap<String, String>,
}

/// Object class a custom property is defined on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyDest {
    /// DNS servers.
    Dnsserver,
    /// DHCP servers.
    Dhcpserver,
    /// DNS zones.
    Zone,
    /// IP ranges.
    Iprange,
    /// IP addresses.
    Ipaddress,
    /// Devices.
    Device,
    /// Interfaces.
    Interface,
    /// Cloud networks.
    Cloudnet,
    /// Cloud service accounts.
    Cloudaccount,
}

/// Custom property type as shown in the management console.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// Free text.
    #[default]
    Text,
    /// Boolean.
    Yesno,
    /// IP address.
    Ipaddress,
    /// Integer.
    Number,
}

/// Parameters of the `props` module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct PropertyParams {
    /// Property name.
    pub name: String,
    /// Desired existence.
    #[serde(default)]
    pub state: DesiredState,
    /// Object class to define the property on.
    pub dest: PropertyDest,
    /// Property type.
    #[serde(default)]
    pub proptype: PropertyType,
    /// Whether a value is mandatory.
    #[serde(default)]
    pub mandatory: bool,
    /// Whether the property is system defined.
    #[serde(default)]
    pub system: bool,
    /// Whether the property is read only.
    #[serde(default)]
    pub readonly: bool,
    /// Whether the property is multiline.
    #[serde(default)]
    pub multiline: bool,
    /// Default value.
    #[serde(default)]
    pub defaultvalue: String,
    /// Predefined selection values (text properties only).
    #[serde(default)]
    pub listitems: Vec<String>,
    /// Associated cloud tags (text properties only).
    #[serde(default)]
    pub cloudtags: Vec<String>,
    /// Push changed values to existing objects on update.
    #[serde(default)]
    pub updateexisting: bool,
}

/// A parameter document: module parameters plus optional connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsDocument<T> {
    /// Module parameters.
    #[serde(flatten)]
    pub params: T,
    /// Connection settings; falls back to CLI flags and environment.
    #[serde(default)]
    pub mm_provider: Option<ProviderConfig>,
}

impl ServerType {
    /// Returns the capitalised name the API expects.
    #[must_use]
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Master => "Master",
            Self::Slave => "Slave",
            Self::Stub => "Stub",
            Self::Forward => "Forward",
        }
    }

    /// Returns true if the zone type takes a list of masters.
    #[must_use]
    pub const fn needs_masters(self) -> bool {
        !matches!(self, Self::Master)
    }
}

impl UserParams {
    /// Returns the authentication type spelled the way the API stores it.
    ///
    /// `internal` becomes `Internal`; anything else is upper-cased (`AD`).
    #[must_use]
    pub fn api_authentication_type(&self) -> Option<String> {
        self.authentication_type.as_deref().map(|kind| {
            if kind.eq_ignore_ascii_case("internal") {
                String::from("Internal")
            } else {
                kind.to_uppercase()
            }
        })
    }
}

impl PropertyDest {
    /// Returns the API collection holding objects of this class.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Dnsserver => "DNSServers",
            Self::Dhcpserver => "DHCPServers",
            Self::Zone => "DNSZones",
            Self::Iprange => "Ranges",
            Self::Ipaddress => "IPAMRecords",
            Self::Device => "Devices",
            Self::Interface => "Interfaces",
            Self::Cloudnet => "CloudNetworks",
            Self::Cloudaccount => "CloudServiceAccounts",
        }
    }
}

impl PropertyType {
    /// Returns the type name used by the API.
    #[must_use]
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Text => "String",
            Self::Yesno => "Boolean",
            Self::Ipaddress => "IPAddress",
            Self::Number => "Integer",
        }
    }

    /// Only text properties carry list items and cloud tags.
    #[must_use]
    pub const fn supports_lists(self) -> bool {
        matches!(self, Self::Text)
    }
}

impl std::fmt::Display for DesiredState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Present => "present",
            Self::Absent => "absent",
        };
        write!(f, "{s}")
    }
}

/// Scalar accepted as a custom property value.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Deserializes a map whose values must be scalars, rendering them as strings.
fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Scalar>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(i) => i.to_string(),
                Scalar::Float(x) => x.to_string(),
                Scalar::Text(s) => s,
            };
            (key, value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_defaults() {
        let params: GroupParams = serde_yaml::from_str("name: local\n").unwrap();
        assert_eq!(params.state, DesiredState::Present);
        assert!(params.desc.is_none());
        assert!(params.users.is_none());
    }

    #[test]
    fn test_user_aliases_and_auth_type() {
        let yaml = r"
username: johnd
password: secret
descr: Operator
authentication_type: internal
roles:
  - DNS Administrators (built-in)
";
        let params: UserParams = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(params.name, "johnd");
        assert_eq!(params.desc.as_deref(), Some("Operator"));
        assert_eq!(params.update_password, UpdatePassword::OnCreate);
        assert!(params.groups.is_none());
        assert_eq!(params.api_authentication_type().as_deref(), Some("Internal"));

        let params = UserParams {
            authentication_type: Some(String::from("ad")),
            ..params
        };
        assert_eq!(params.api_authentication_type().as_deref(), Some("AD"));
        let rendered = serde_json::to_value(&params).unwrap();
        assert!(rendered.get("password").is_none());
    }

    #[test]
    fn test_zone_custom_properties_are_stringified() {
        let yaml = r"
name: example.com
nameserver: ns1.example.com
customproperties:
  location: Reykjavik
  rack: 12
  monitored: true
";
        let params: ZoneParams = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(params.servtype, ServerType::Master);
        assert_eq!(params.customproperties["location"], "Reykjavik");
        assert_eq!(params.customproperties["rack"], "12");
        assert_eq!(params.customproperties["monitored"], "true");
    }

    #[test]
    fn test_zone_rejects_nested_custom_property() {
        let yaml = "name: example.com\ncustomproperties:\n  location:\n    city: Reykjavik\n";
        let result: std::result::Result<ZoneParams, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_servtype_accepts_capitalised() {
        let params: ZoneParams =
            serde_yaml::from_str("name: example.com\nservtype: Slave\n").unwrap();
        assert_eq!(params.servtype, ServerType::Slave);
        assert_eq!(params.servtype.api_name(), "Slave");
        assert!(params.servtype.needs_masters());
    }

    #[test]
    fn test_property_dest_collections() {
        assert_eq!(PropertyDest::Zone.collection(), "DNSZones");
        assert_eq!(PropertyDest::Ipaddress.collection(), "IPAMRecords");
        assert_eq!(PropertyType::Yesno.api_name(), "Boolean");
    }

    #[test]
    fn test_document_with_provider() {
        let yaml = r"
name: local
users: [johndoe]
mm_provider:
  mm_url: http://mm.example.net
  mm_user: apiuser
  mm_password: apipasswd
";
        let doc: ParamsDocument<GroupParams> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.params.name, "local");
        assert_eq!(doc.params.users, Some(vec![String::from("johndoe")]));
        assert_eq!(doc.mm_provider.map(|p| p.mm_user), Some(String::from("apiuser")));
    }
}

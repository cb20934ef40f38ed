//! Parameter validation.
//!
//! Every check here runs before the API client is created, so malformed
//! input never reaches the network.

use std::collections::HashSet;
use std::net::IpAddr;
use tracing::{debug, warn};

use crate::error::{ConfigError, MicetroError, Result};

use super::params::{DesiredState, GroupParams, PropertyParams, UserParams, ZoneParams};
use super::provider::ProviderConfig;

/// Validator for module parameters.
#[derive(Debug, Default)]
pub struct ParamValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ParamValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates connection settings.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate_provider(&self, provider: &ProviderConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        let url = provider.mm_url.trim();
        if url.is_empty() {
            result.error("mm_provider.mm_url", "missing required argument: mm_url");
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            result.error(
                "mm_provider.mm_url",
                format!("mm_url '{url}' must start with http:// or https://"),
            );
        }

        if provider.mm_user.trim().is_empty() {
            result.error("mm_provider.mm_user", "missing required argument: mm_user");
        }

        if provider.mm_password.is_empty() {
            result.error(
                "mm_provider.mm_password",
                "missing required argument: mm_password",
            );
        }

        if provider.timeout_secs == 0 {
            result.error("mm_provider.timeout_secs", "timeout must be at least one second");
        }

        result.into_result()
    }

    /// Validates `group` parameters.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate_group(&self, params: &GroupParams) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_name(&params.name, &mut result);

        if let Some(users) = &params.users {
            let mut seen = HashSet::new();
            for (i, user) in users.iter().enumerate() {
                if user.trim().is_empty() {
                    result.error(format!("users[{i}]"), "user name cannot be empty");
                } else if !seen.insert(user.as_str()) {
                    result.warning(format!("user '{user}' is listed more than once"));
                }
            }

            if params.state == DesiredState::Absent {
                result.warning(String::from("users are ignored when state=absent"));
            }
        }

        result.into_result()
    }

    /// Validates `zone` parameters.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate_zone(&self, params: &ZoneParams) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_name(&params.name, &mut result);

        if params.state == DesiredState::Present {
            if params.nameserver.as_deref().is_none_or(|n| n.trim().is_empty()) {
                result.error("nameserver", "missing required argument: nameserver");
            }

            // Masters are only required when the zone is created.
            let masters = params.masters.as_deref().unwrap_or_default();
            if !params.servtype.needs_masters() && !masters.is_empty() {
                result.warning(String::from("masters are ignored for a master zone"));
            }
        }

        for (i, master) in params.masters.iter().flatten().enumerate() {
            if master.parse::<IpAddr>().is_err() {
                result.error(
                    format!("masters[{i}]"),
                    format!("'{master}' is not a valid IP address"),
                );
            }
        }

        for key in params.customproperties.keys() {
            if key.trim().is_empty() {
                result.error("customproperties", "custom property name cannot be empty");
            }
        }

        result.into_result()
    }

    /// Validates `user` parameters.
    ///
    /// Password and authentication type are only needed to create the
    /// user, which is decided after reading the server.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate_user(&self, params: &UserParams) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_name(&params.name, &mut result);

        if let Some(email) = params.email.as_deref().filter(|e| !e.is_empty())
            && !is_email(email)
        {
            result.error("email", format!("'{email}' is not a valid email address"));
        }

        if params
            .authentication_type
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            result.error("authentication_type", "authentication type cannot be empty");
        }

        Self::validate_names("groups", params.groups.as_deref(), &mut result);
        Self::validate_names("roles", params.roles.as_deref(), &mut result);

        if params.state == DesiredState::Absent
            && (params.groups.is_some() || params.roles.is_some())
        {
            result.warning(String::from("groups and roles are ignored when state=absent"));
        }

        result.into_result()
    }

    /// Validates `props` parameters.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate_property(&self, params: &PropertyParams) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_name(&params.name, &mut result);

        if !params.proptype.supports_lists()
            && (!params.listitems.is_empty() || !params.cloudtags.is_empty())
        {
            result.warning(String::from(
                "listitems and cloudtags are only used for text properties",
            ));
        }

        if !params.listitems.is_empty()
            && !params.defaultvalue.is_empty()
            && !params.listitems.contains(&params.defaultvalue)
        {
            result.error(
                "defaultvalue",
                format!(
                    "default value '{}' is not one of the list items",
                    params.defaultvalue
                ),
            );
        }

        result.into_result()
    }

    /// Checks a list of names for blanks and repeats.
    fn validate_names(field: &str, names: Option<&[String]>, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (i, name) in names.unwrap_or_default().iter().enumerate() {
            if name.trim().is_empty() {
                result.error(format!("{field}[{i}]"), format!("{field} entry cannot be empty"));
            } else if !seen.insert(name.as_str()) {
                result.warning(format!("'{name}' is listed more than once in {field}"));
            }
        }
    }

    /// Validates the resource name shared by all modules.
    fn validate_name(name: &str, result: &mut ValidationResult) {
        if name.trim().is_empty() {
            result.error("name", "missing required argument: name");
        } else if name.trim() != name {
            result.error("name", format!("name '{name}' has leading or trailing whitespace"));
        }
    }
}

/// A loose shape check: one `@` with text on both sides.
fn is_email(value: &str) -> bool {
    value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && !domain.is_empty() && !domain.contains('@')
    })
}

impl ValidationResult {
    /// Returns true if no errors were found.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn warning(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    /// Turns the collected findings into the first error, if any.
    fn into_result(self) -> Result<Self> {
        match self.errors.first() {
            None => {
                debug!("Parameter validation passed");
                Ok(self)
            }
            Some(first) => Err(MicetroError::Config(ConfigError::ValidationError {
                message: first.message.clone(),
                field: Some(first.field.clone()),
            })),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

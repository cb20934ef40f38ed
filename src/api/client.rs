//! Micetro API client implementation.
//!
//! This module provides the HTTP client for the Micetro REST API
//! (`/mmws/api`). Calls are never retried here; a caller that wants
//! retries wraps the whole invocation.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::{PropertyDest, ProviderConfig};
use crate::error::{ApiError, MicetroError, Result};

use super::MicetroApi;
use super::types::{
    ErrorEnvelope, Group, ObjectRef, PropertyDefinition, PropertyValue, ResourceKind, User,
    UserRef, UserSpec, Zone, ZoneSpec, zone_names_equal,
};

/// Placeholder object reference used to address property definitions.
const DEFINITION_OWNER: &str = "1";

/// Micetro API client.
#[derive(Debug, Clone)]
pub struct MicetroClient {
    /// HTTP client.
    client: Client,
    /// API base URL, ending in a slash.
    base_url: String,
    /// Login user.
    user: String,
    /// Login password.
    password: String,
    /// Comment recorded with every change.
    save_comment: String,
    /// Request timeout, for error messages.
    timeout_secs: u64,
}

impl MicetroClient {
    /// Creates a new client from explicit connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(provider: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(provider.timeout_secs))
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: provider.api_base(),
            user: provider.mm_user.clone(),
            password: provider.mm_password.clone(),
            save_comment: provider.save_comment().to_string(),
            timeout_secs: provider.timeout_secs,
        })
    }

    /// Sends a single request and returns the `result` member of the body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path.trim_start_matches('/'));
        trace!("{method} {url} {query:?}");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .basic_auth(&self.user, Some(&self.password));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::transport(format!(
                    "{method} {path} timed out after {} seconds",
                    self.timeout_secs
                ))
            } else {
                ApiError::transport(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::map_status(status, path, &text, method == Method::GET).into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let mut body: Value = serde_json::from_str(&text)
            .map_err(|e| ApiError::invalid_response(format!("Failed to parse response: {e}")))?;

        Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
    }

    /// Maps a non-2xx response to a typed error.
    fn map_status(status: StatusCode, path: &str, body: &str, is_read: bool) -> ApiError {
        let message = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
            |_| body.trim().to_string(),
            |envelope| envelope.error.message,
        );

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::AuthenticationFailed {
                message: if message.is_empty() {
                    String::from("Invalid user name or password")
                } else {
                    message
                },
            },
            StatusCode::NOT_FOUND => ApiError::NotFound {
                kind: String::from("object"),
                name: path.to_string(),
            },
            _ if is_read && message.to_lowercase().contains("not found") => ApiError::NotFound {
                kind: String::from("object"),
                name: path.to_string(),
            },
            _ => ApiError::server(status.as_u16(), message),
        }
    }

    /// Performs a GET and deserializes the `result` member.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the result does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let result = self.send(Method::GET, path, query, None).await?;
        serde_json::from_value(result).map_err(|e| {
            MicetroError::Api(ApiError::invalid_response(format!(
                "Unexpected result for {path}: {e}"
            )))
        })
    }

    /// Performs a POST with the save comment added to the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn post_json(&self, path: &str, body: Map<String, Value>) -> Result<Value> {
        let body = self.with_comment(body);
        self.send(Method::POST, path, &[], Some(&body)).await
    }

    /// Performs a PUT with the save comment added to the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn put_json(&self, path: &str, body: Map<String, Value>) -> Result<Value> {
        let body = self.with_comment(body);
        self.send(Method::PUT, path, &[], Some(&body)).await
    }

    /// Performs a DELETE carrying the save comment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_json(&self, path: &str) -> Result<()> {
        let body = self.with_comment(Map::new());
        self.send(Method::DELETE, path, &[], Some(&body)).await?;
        Ok(())
    }

    fn with_comment(&self, mut body: Map<String, Value>) -> Value {
        body.insert(String::from("saveComment"), json!(self.save_comment));
        Value::Object(body)
    }

    /// Looks up a single object by name in a collection.
    ///
    /// `scope` adds extra query parameters, e.g. the DNS view of a zone.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if no object has exactly this name.
    pub async fn get(&self, kind: ResourceKind, name: &str, scope: &[(&str, &str)]) -> Result<Value> {
        let mut query = vec![("filter", name)];
        query.extend_from_slice(scope);

        let mut result: Value = self.get_json(kind.collection(), &query).await?;
        let items = match result.get_mut(kind.list_key()).map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        items
            .into_iter()
            .find(|item| {
                item.get("name").and_then(Value::as_str).is_some_and(|n| {
                    if kind == ResourceKind::Zone {
                        zone_names_equal(n, name)
                    } else {
                        n == name
                    }
                })
            })
            .ok_or_else(|| {
                MicetroError::Api(ApiError::NotFound {
                    kind: kind.to_string(),
                    name: name.to_string(),
                })
            })
    }

    /// Creates an object and returns its reference.
    ///
    /// `extra` holds top-level body members sent next to the object.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the object.
    pub async fn create(
        &self,
        kind: ResourceKind,
        spec: Value,
        extra: Map<String, Value>,
    ) -> Result<String> {
        let mut body = extra;
        body.insert(kind.item_key().to_string(), spec);

        let result = self.post_json(kind.collection(), body).await?;
        result
            .get("ref")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                MicetroError::Api(ApiError::invalid_response(format!(
                    "Create {kind} returned no reference"
                )))
            })
    }

    /// Changes properties of an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the change.
    pub async fn update(&self, reference: &str, properties: &[PropertyValue]) -> Result<()> {
        let mut body = Map::new();
        body.insert(String::from("ref"), json!(reference));
        body.insert(String::from("properties"), json!(properties));
        self.put_json(reference, body).await?;
        Ok(())
    }

    /// Deletes an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the deletion.
    pub async fn delete(&self, reference: &str) -> Result<()> {
        self.delete_json(reference).await
    }

    fn definitions_path(dest: PropertyDest) -> String {
        format!(
            "{}/{DEFINITION_OWNER}/{}",
            dest.collection(),
            ResourceKind::PropertyDefinition.collection()
        )
    }

    fn definition_body(definition: &PropertyDefinition) -> Result<Value> {
        let mut value = serde_json::to_value(definition)
            .map_err(|e| MicetroError::internal(format!("Failed to encode definition: {e}")))?;
        // Non-text properties reject list items and tags.
        if definition.property_type != "String"
            && let Some(object) = value.as_object_mut()
        {
            object.remove("listItems");
            object.remove("cloudTags");
        }
        Ok(value)
    }
}

/// Converts a not-found error into `None`.
fn found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(MicetroError::Api(ApiError::NotFound { .. })) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Converts a not-found or any other client error into `None`.
///
/// Used where the server rejects an unknown reference with a 4xx whose
/// message varies.
fn found_or_rejected<T>(result: Result<T>) -> Result<Option<T>> {
    match found(result) {
        Err(MicetroError::Api(ApiError::Server { status, .. })) if (400..500).contains(&status) => {
            Ok(None)
        }
        other => other,
    }
}

fn decode<T: DeserializeOwned>(kind: ResourceKind, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        MicetroError::Api(ApiError::invalid_response(format!("Malformed {kind}: {e}")))
    })
}

#[async_trait]
impl MicetroApi for MicetroClient {
    async fn find_group(&self, name: &str) -> Result<Option<Group>> {
        found(self.get(ResourceKind::Group, name, &[]).await)?
            .map(|v| decode(ResourceKind::Group, v))
            .transpose()
    }

    async fn group_members(&self, group_ref: &str) -> Result<Vec<UserRef>> {
        #[derive(serde::Deserialize)]
        struct Members {
            #[serde(default)]
            users: Vec<UserRef>,
        }

        let path = format!("{group_ref}/{}", ResourceKind::User.collection());
        let members: Members = self.get_json(&path, &[]).await?;
        Ok(members.users)
    }

    async fn create_group(&self, name: &str, description: &str) -> Result<String> {
        let spec = json!({
            "name": name,
            "description": description,
            "adIntegrated": false,
        });
        self.create(ResourceKind::Group, spec, Map::new()).await
    }

    async fn update_group(&self, group_ref: &str, properties: &[PropertyValue]) -> Result<()> {
        self.update(group_ref, properties).await
    }

    async fn delete_group(&self, group_ref: &str) -> Result<()> {
        self.delete(group_ref).await
    }

    async fn find_user(&self, name: &str) -> Result<Option<User>> {
        found(self.get(ResourceKind::User, name, &[]).await)?
            .map(|v| decode(ResourceKind::User, v))
            .transpose()
    }

    async fn create_user(&self, spec: &UserSpec) -> Result<String> {
        let value = serde_json::to_value(spec)
            .map_err(|e| MicetroError::internal(format!("Failed to encode user: {e}")))?;
        self.create(ResourceKind::User, value, Map::new()).await
    }

    async fn update_user(&self, user_ref: &str, properties: &[PropertyValue]) -> Result<()> {
        self.update(user_ref, properties).await
    }

    async fn delete_user(&self, user_ref: &str) -> Result<()> {
        self.delete(user_ref).await
    }

    async fn add_group_member(&self, group_ref: &str, user_ref: &str) -> Result<()> {
        let path = format!("{group_ref}/{user_ref}");
        self.put_json(&path, Map::new()).await?;
        Ok(())
    }

    async fn remove_group_member(&self, group_ref: &str, user_ref: &str) -> Result<()> {
        let path = format!("{group_ref}/{user_ref}");
        self.delete_json(&path).await
    }

    async fn find_role(&self, name: &str) -> Result<Option<ObjectRef>> {
        found(self.get(ResourceKind::Role, name, &[]).await)?
            .map(|v| decode(ResourceKind::Role, v))
            .transpose()
    }

    // Role assignments hang off the user, unlike group membership.
    async fn add_user_role(&self, user_ref: &str, role_ref: &str) -> Result<()> {
        let path = format!("{user_ref}/{role_ref}");
        self.put_json(&path, Map::new()).await?;
        Ok(())
    }

    async fn remove_user_role(&self, user_ref: &str, role_ref: &str) -> Result<()> {
        let path = format!("{user_ref}/{role_ref}");
        self.delete_json(&path).await
    }

    async fn find_dns_view(&self, nameserver: &str) -> Result<Option<String>> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Views {
            #[serde(default)]
            dns_views: Vec<super::types::DnsView>,
        }

        let views: Option<Views> = found_or_rejected(
            self.get_json(
                ResourceKind::DnsView.collection(),
                &[("dnsServerRef", nameserver)],
            )
            .await,
        )?;
        let views = views.map(|v| v.dns_views).unwrap_or_default();
        debug!("Nameserver {nameserver} has {} views", views.len());

        // Prefer the default (unnamed) view.
        let view = views
            .iter()
            .find(|v| v.name.is_empty())
            .or_else(|| views.first());
        Ok(view.map(|v| v.reference.clone()))
    }

    async fn find_zone(&self, name: &str, view_ref: Option<&str>) -> Result<Option<Zone>> {
        let scope: Vec<(&str, &str)> = view_ref
            .map(|r| ("dnsViewRef", r.trim_start_matches("DNSViews/")))
            .into_iter()
            .collect();
        found(self.get(ResourceKind::Zone, name, &scope).await)?
            .map(|v| decode(ResourceKind::Zone, v))
            .transpose()
    }

    async fn create_zone(&self, spec: &ZoneSpec) -> Result<String> {
        let value = serde_json::to_value(spec)
            .map_err(|e| MicetroError::internal(format!("Failed to encode zone: {e}")))?;
        let mut extra = Map::new();
        if !spec.masters.is_empty() {
            extra.insert(String::from("masters"), json!(spec.masters));
        }
        self.create(ResourceKind::Zone, value, extra).await
    }

    async fn update_zone(&self, zone_ref: &str, properties: &[PropertyValue]) -> Result<()> {
        self.update(zone_ref, properties).await
    }

    async fn delete_zone(&self, zone_ref: &str) -> Result<()> {
        self.delete(zone_ref).await
    }

    async fn find_property_definition(
        &self,
        dest: PropertyDest,
        name: &str,
    ) -> Result<Option<PropertyDefinition>> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Wrapped {
            property_definition: PropertyDefinition,
        }

        let path = format!("{}/{name}", Self::definitions_path(dest));
        let wrapped: Option<Wrapped> = found(self.get_json(&path, &[]).await)?;
        Ok(wrapped.map(|w| w.property_definition))
    }

    async fn create_property_definition(
        &self,
        dest: PropertyDest,
        definition: &PropertyDefinition,
    ) -> Result<()> {
        let mut body = Map::new();
        body.insert(
            ResourceKind::PropertyDefinition.item_key().to_string(),
            Self::definition_body(definition)?,
        );
        self.post_json(&Self::definitions_path(dest), body).await?;
        Ok(())
    }

    async fn update_property_definition(
        &self,
        dest: PropertyDest,
        definition: &PropertyDefinition,
        update_existing: bool,
    ) -> Result<()> {
        let mut body = Map::new();
        body.insert(
            ResourceKind::PropertyDefinition.item_key().to_string(),
            Self::definition_body(definition)?,
        );
        if update_existing {
            body.insert(String::from("updateExisting"), json!(true));
        }
        let path = format!("{}/{}", Self::definitions_path(dest), definition.name);
        self.put_json(&path, body).await?;
        Ok(())
    }

    async fn delete_property_definition(&self, dest: PropertyDest, name: &str) -> Result<()> {
        let path = format!("{}/{name}", Self::definitions_path(dest));
        self.delete_json(&path).await
    }
}

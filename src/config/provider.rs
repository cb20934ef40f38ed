//! Connection settings for the Micetro API.
//!
//! The provider is an explicit value handed to every module call. It is
//! never stored in a process-wide location.

use serde::{Deserialize, Serialize};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Comment attached to every change made through the API.
pub const DEFAULT_SAVE_COMMENT: &str = "Ansible API";

/// API path below the server URL.
const API_PATH: &str = "mmws/api";

/// Connection parameters (`mm_provider`).
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Micetro server URL, e.g. `http://micetro.example.net`.
    pub mm_url: String,
    /// User to log in with.
    pub mm_user: String,
    /// Password to log in with.
    pub mm_password: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Comment recorded by the server for every change.
    #[serde(default)]
    pub save_comment: Option<String>,
}

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ProviderConfig {
    /// Creates a provider from its three required settings.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            mm_url: url.into(),
            mm_user: user.into(),
            mm_password: password.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            save_comment: None,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Returns the REST API base URL, always ending in a slash.
    ///
    /// A URL that already points at the API path is used as is.
    #[must_use]
    pub fn api_base(&self) -> String {
        let trimmed = self.mm_url.trim_end_matches('/');
        if trimmed.ends_with(API_PATH) {
            format!("{trimmed}/")
        } else {
            format!("{trimmed}/{API_PATH}/")
        }
    }

    /// Returns the save comment to send with mutations.
    #[must_use]
    pub fn save_comment(&self) -> &str {
        self.save_comment.as_deref().unwrap_or(DEFAULT_SAVE_COMMENT)
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("mm_url", &self.mm_url)
            .field("mm_user", &self.mm_user)
            .field("mm_password", &"********")
            .field("timeout_secs", &self.timeout_secs)
            .field("save_comment", &self.save_comment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base() {
        let provider = ProviderConfig::new("http://mm.example.net", "u", "p");
        assert_eq!(provider.api_base(), "http://mm.example.net/mmws/api/");

        let provider = ProviderConfig::new("http://mm.example.net/", "u", "p");
        assert_eq!(provider.api_base(), "http://mm.example.net/mmws/api/");

        let provider = ProviderConfig::new("https://mm.example.net/mmws/api", "u", "p");
        assert_eq!(provider.api_base(), "https://mm.example.net/mmws/api/");
    }

    #[test]
    fn test_password_not_in_debug() {
        let provider = ProviderConfig::new("http://mm", "apiuser", "s3cret");
        let debug = format!("{provider:?}");
        assert!(debug.contains("apiuser"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_defaults_from_yaml() {
        let yaml = "mm_url: http://mm\nmm_user: a\nmm_password: b\n";
        let provider: ProviderConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(provider.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(provider.save_comment(), DEFAULT_SAVE_COMMENT);
    }
}

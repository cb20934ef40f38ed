//! Parameter file parser.
//!
//! Loads module parameter documents from YAML (or JSON, which is valid
//! YAML) files and optional `.env` files.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, MicetroError, Result};

use super::params::ParamsDocument;

/// Parser for module parameter documents.
#[derive(Debug, Default)]
pub struct ParamsParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ParamsParser {
    /// Creates a new parameter parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path used to locate the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a parameter document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file<T: DeserializeOwned>(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<ParamsDocument<T>> {
        let path = path.as_ref();
        info!("Loading parameters from: {}", path.display());

        if !path.exists() {
            return Err(MicetroError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            MicetroError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_str(&content, Some(path))
    }

    /// Parses a parameter document from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid.
    pub fn parse_str<T: DeserializeOwned>(
        &self,
        content: &str,
        source: Option<&Path>,
    ) -> Result<ParamsDocument<T>> {
        debug!("Parsing parameter document");

        serde_yaml::from_str(content).map_err(|e| {
            MicetroError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                MicetroError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DesiredState, GroupParams, ZoneParams};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_group_document() {
        let yaml = r#"
name: local
desc: "A local group"
state: present
users:
  - johndoe
  - angelina
"#;
        let parser = ParamsParser::new();
        let doc: ParamsDocument<GroupParams> = parser.parse_str(yaml, None).unwrap();
        assert_eq!(doc.params.name, "local");
        assert_eq!(doc.params.desc.as_deref(), Some("A local group"));
        assert_eq!(doc.params.users.map(|u| u.len()), Some(2));
        assert!(doc.mm_provider.is_none());
    }

    #[test]
    fn test_parse_json_document() {
        let json = r#"{"name": "example.com", "state": "absent", "nameserver": "ns1"}"#;
        let parser = ParamsParser::new();
        let doc: ParamsDocument<ZoneParams> = parser.parse_str(json, None).unwrap();
        assert_eq!(doc.params.state, DesiredState::Absent);
        assert_eq!(doc.params.nameserver.as_deref(), Some("ns1"));
    }

    #[test]
    fn test_parse_invalid_state() {
        let parser = ParamsParser::new();
        let result = parser.parse_str::<GroupParams>("name: local\nstate: maybe\n", None);
        assert!(matches!(
            result,
            Err(MicetroError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name: local\nusers: []").unwrap();

        let parser = ParamsParser::new();
        let doc: ParamsDocument<GroupParams> = parser.load_file(file.path()).unwrap();
        assert_eq!(doc.params.users, Some(vec![]));
    }

    #[test]
    fn test_load_missing_file() {
        let parser = ParamsParser::new();
        let result = parser.load_file::<GroupParams>("/nonexistent/params.yaml");
        assert!(matches!(
            result,
            Err(MicetroError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}

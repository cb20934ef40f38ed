//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{DEFAULT_TIMEOUT_SECS, ProviderConfig};

/// Micetro - Idempotent group, user, zone and property reconciliation.
#[derive(Parser, Debug)]
#[command(name = "micetro")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Micetro server URL, used when the parameter file has no `mm_provider`.
    #[arg(long, global = true, env = "MM_URL")]
    pub url: Option<String>,

    /// API user.
    #[arg(long, global = true, env = "MM_USER")]
    pub user: Option<String>,

    /// API password.
    #[arg(long, global = true, env = "MM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "MM_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile a user group and its members.
    Group {
        /// Parameter file (YAML or JSON).
        #[arg(short, long)]
        params: PathBuf,

        /// Report what would change without changing anything.
        #[arg(long)]
        check: bool,
    },

    /// Reconcile a DNS zone.
    Zone {
        /// Parameter file (YAML or JSON).
        #[arg(short, long)]
        params: PathBuf,

        /// Report what would change without changing anything.
        #[arg(long)]
        check: bool,
    },

    /// Reconcile a user account with its groups and roles.
    User {
        /// Parameter file (YAML or JSON).
        #[arg(short, long)]
        params: PathBuf,

        /// Report what would change without changing anything.
        #[arg(long)]
        check: bool,
    },

    /// Reconcile a custom property definition.
    Property {
        /// Parameter file (YAML or JSON).
        #[arg(short, long)]
        params: PathBuf,

        /// Report what would change without changing anything.
        #[arg(long)]
        check: bool,
    },

    /// Validate a parameter file without connecting.
    Validate {
        /// Kind of parameters in the file.
        kind: ResourceArg,

        /// Parameter file (YAML or JSON).
        #[arg(short, long)]
        params: PathBuf,
    },
}

/// Resource kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceArg {
    /// User group.
    Group,
    /// DNS zone.
    Zone,
    /// User account.
    User,
    /// Custom property definition.
    Property,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Builds connection settings from flags and environment.
    ///
    /// Returns `None` unless URL, user and password are all set.
    #[must_use]
    pub fn provider(&self) -> Option<ProviderConfig> {
        let (Some(url), Some(user), Some(password)) = (&self.url, &self.user, &self.password)
        else {
            return None;
        };
        Some(
            ProviderConfig::new(url.as_str(), user.as_str(), password.as_str())
                .with_timeout(self.timeout),
        )
    }
}

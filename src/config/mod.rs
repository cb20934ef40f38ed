//! Configuration module for the Micetro reconciliation client.
//!
//! This module handles everything the caller supplies:
//! - Connection settings (`mm_provider`)
//! - Module parameters for groups, users, zones and property definitions
//! - Loading parameter documents from files
//! - Validation before any network call

mod params;
mod parser;
mod provider;
mod validator;

pub use params::{
    DesiredState, GroupParams, ParamsDocument, PropertyDest, PropertyParams, PropertyType,
    ServerType, UpdatePassword, UserParams, ZoneParams,
};
pub use parser::ParamsParser;
pub use provider::{DEFAULT_SAVE_COMMENT, DEFAULT_TIMEOUT_SECS, ProviderConfig};
pub use validator::{ParamValidator, ValidationError, ValidationResult};

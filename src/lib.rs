// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Micetro Reconcile
//!
//! Idempotent reconciliation of groups, users, DNS zones and custom
//! property definitions on a Men&Mice Micetro server.
//!
//! ## Overview
//!
//! Each invocation describes the desired state of one resource. The
//! crate reads the resource from the server, computes the minimal change
//! set and applies it, reporting whether anything changed:
//!
//! - Running the same invocation twice reports `changed=true`, then `changed=false`
//! - Deleting an already absent resource is a no-op
//! - Group members that cannot be resolved are reported per member without
//!   aborting the rest of the call
//! - A user's groups and roles are diffed by name; passwords are never
//!   reported
//!
//! ## Architecture
//!
//! 1. **Desired State**: module parameters ([`config`])
//! 2. **Observed State**: read from the Micetro REST API ([`api`])
//! 3. **Change Set**: computed by the [`planner`]
//! 4. **Reconciler**: applies the change set ([`reconciler`])
//! 5. **Entry Point**: validation and orchestration ([`runner`])
//!
//! Nothing is cached between invocations; the server is the single source
//! of truth.
//!
//! ## Example
//!
//! ```yaml
//! name: local
//! desc: A local group
//! state: present
//! users:
//!   - johndoe
//!   - angelina
//! mm_provider:
//!   mm_url: http://micetro.example.net
//!   mm_user: apiuser
//!   mm_password: apipasswd
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod planner;
pub mod reconciler;
pub mod runner;

#[cfg(test)]
mod test_utils;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{MicetroApi, MicetroClient, Observed, ResourceReader};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{
    DesiredState, GroupParams, ParamValidator, ParamsParser, PropertyParams, ProviderConfig,
    UserParams, ZoneParams,
};
pub use error::{MicetroError, Result};
pub use planner::{DiffEngine, ReconcileAction};
pub use reconciler::{ItemError, ReconciliationResult, Reconciler};
pub use runner::ModuleRunner;

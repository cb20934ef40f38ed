//! Planning module for reconcile operations.
//!
//! This module handles the comparison between desired and observed states
//! and the choice of the action that reconciles them.

mod diff;
mod plan;

pub use diff::{
    DiffDetail, DiffEngine, GroupChangeSet, PropertyChangeSet, UserChangeSet, ZoneChangeSet,
    desired_definition,
};
pub use plan::ReconcileAction;

//! Reconcile action selection.
//!
//! Maps the desired state, the observed existence of a resource and the
//! computed change set to the single action an invocation performs.

use serde::Serialize;

use crate::config::DesiredState;

/// Action taken for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileAction {
    /// Create the resource.
    Create,
    /// Apply the change set to the existing resource.
    Update,
    /// Delete the resource.
    Delete,
    /// Nothing to do.
    Noop,
}

impl ReconcileAction {
    /// Decides the action for a resource.
    ///
    /// | desired | exists | changes | action |
    /// |---------|--------|---------|--------|
    /// | present | no     | any     | create |
    /// | present | yes    | yes     | update |
    /// | present | yes    | no      | noop   |
    /// | absent  | yes    | any     | delete |
    /// | absent  | no     | any     | noop   |
    #[must_use]
    pub const fn decide(state: DesiredState, exists: bool, has_changes: bool) -> Self {
        match (state, exists) {
            (DesiredState::Present, false) => Self::Create,
            (DesiredState::Present, true) if has_changes => Self::Update,
            (DesiredState::Absent, true) => Self::Delete,
            _ => Self::Noop,
        }
    }

    /// Returns true if the action mutates the server.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Noop)
    }

    /// Returns a human-readable description of the action.
    #[must_use]
    pub fn description(self, kind: &str, name: &str) -> String {
        match self {
            Self::Create => format!("Create {kind} '{name}'"),
            Self::Update => format!("Update {kind} '{name}'"),
            Self::Delete => format!("Delete {kind} '{name}'"),
            Self::Noop => format!("No change for {kind} '{name}'"),
        }
    }
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Noop => "noop",
        };
        write!(f, "{s}")
    }
}

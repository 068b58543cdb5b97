//! Generation lifecycle states.

use serde::{Deserialize, Serialize};

/// Where a generation is in its lifecycle.
///
/// A generation the manager has never seen is uninstalled; there is no
/// variant for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Installing,
    /// Precached and waiting for activation.
    Installed,
    Active,
    /// Replaced by a newer generation; deletion pending or failed.
    Superseded,
    Deleted,
}

impl GenerationState {
    /// Whether the generation may be promoted to active from this state.
    pub fn can_activate(self) -> bool {
        matches!(self, GenerationState::Installed | GenerationState::Active)
    }
}

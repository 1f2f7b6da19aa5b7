use crate::{EnforcementMode, ScopedKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The initiative a member policy was expanded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentInitiative {
    pub id: String,
    pub display_name: String,
}

/// One concrete (policy, scope, parameter-set) instance, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPolicy {
    pub policy_id: String,
    pub display_name: String,
    pub category: String,
    pub effect: String,

    /// Archetype that declared the originating assignment
    pub scope: String,
    pub assignment_name: String,

    /// Set for members expanded out of an initiative; `None` for direct
    /// policy assignments
    pub parent: Option<ParentInitiative>,

    /// Final merged parameters. Unknown override keys pass through as-is;
    /// the definition schema may be incomplete.
    pub effective_parameters: BTreeMap<String, Value>,

    /// True when the policy's own definition could not be resolved and the
    /// row carries placeholder metadata
    pub unresolved: bool,

    /// Best-effort reference URL for the definition
    pub reference_url: String,
}

impl ResolvedPolicy {
    /// Scope-aware identity of this instance.
    pub fn scoped_key(&self) -> ScopedKey {
        ScopedKey::new(self.policy_id.clone(), self.scope.clone())
    }

    /// True for rows not expanded out of an initiative.
    pub fn is_direct(&self) -> bool {
        self.parent.is_none()
    }

    /// Count of degraded facts on this row; lower is richer. Used by the
    /// identity resolver to pick between duplicate occurrences.
    pub fn unresolved_weight(&self) -> usize {
        usize::from(self.unresolved)
    }
}

/// One concrete (initiative, scope) instance with its expanded members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedInitiative {
    pub initiative_id: String,
    pub display_name: String,
    pub category: String,
    pub version: String,

    pub scope: String,
    pub assignment_name: String,
    pub enforcement_mode: EnforcementMode,

    /// Always equal to `members.len()`, including flagged members
    pub member_count: usize,

    /// Ordered member policies, in definition order
    pub members: Vec<ResolvedPolicy>,

    /// True when the initiative definition itself could not be resolved
    pub unresolved: bool,

    /// True when the definition's declared member count disagreed with the
    /// parsed member list (the parsed list wins)
    pub count_mismatch: bool,

    /// Best-effort reference URL for the definition
    pub reference_url: String,

    /// Best-effort link to the assignment document
    pub assignment_url: String,
}

impl ResolvedInitiative {
    /// Scope-aware identity of this instance.
    pub fn scoped_key(&self) -> ScopedKey {
        ScopedKey::new(self.initiative_id.clone(), self.scope.clone())
    }

    /// Degraded facts on this row and its members; lower is richer.
    pub fn unresolved_weight(&self) -> usize {
        usize::from(self.unresolved)
            + usize::from(self.count_mismatch)
            + self.members.iter().map(ResolvedPolicy::unresolved_weight).sum::<usize>()
    }
}

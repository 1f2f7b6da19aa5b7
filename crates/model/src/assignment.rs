use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One organizational scope and the raw assignments declared at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archetype {
    /// Archetype name, used as the scope label on every resolved row
    pub name: String,

    /// Raw assignment documents declared by this archetype
    pub assignments: Vec<RawAssignment>,
}

/// One assignment document as fetched, before classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAssignment {
    /// Assignment name (unique within a scope)
    pub name: String,

    /// Display name, falls back to `name` when absent
    pub display_name: Option<String>,

    /// Target definition id: a full ARM-style resource path or a bare id
    pub target_id: String,

    /// Enforcement mode as declared ("Default" / "DoNotEnforce")
    pub enforcement_mode: Option<String>,

    /// Explicit target-kind discriminator, when the document carries one
    pub kind_hint: Option<TargetKind>,

    /// Assignment-level parameter overrides, already unwrapped from their
    /// `{"value": ...}` envelopes
    pub overrides: BTreeMap<String, Value>,

    /// Where this assignment document lives (for link building)
    pub source_url: Option<String>,
}

/// What an assignment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Policy,
    Initiative,
}

impl TargetKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            TargetKind::Policy => "Policy",
            TargetKind::Initiative => "Initiative",
        }
    }
}

/// Enforcement mode of an assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnforcementMode {
    #[default]
    Default,
    DoNotEnforce,
}

impl EnforcementMode {
    /// Parse the declared mode. Unknown strings fall back to `Default`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("donotenforce") => EnforcementMode::DoNotEnforce,
            _ => EnforcementMode::Default,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EnforcementMode::Default => "Default",
            EnforcementMode::DoNotEnforce => "DoNotEnforce",
        }
    }
}

/// A classified assignment: the declared binding of one definition to one
/// scope. Immutable after classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Assignment name
    pub name: String,

    /// Display name (never empty; defaults to the assignment name)
    pub display_name: String,

    /// Whether the target is a policy or an initiative
    pub kind: TargetKind,

    /// Extracted definition id (last segment of the target path)
    pub target_id: String,

    pub enforcement_mode: EnforcementMode,

    /// Scope label: the archetype that declared this assignment
    pub scope: String,

    /// Parameter overrides keyed by the target definition's parameter names
    pub overrides: BTreeMap<String, Value>,

    /// Link to the assignment document, when known
    pub source_url: Option<String>,
}

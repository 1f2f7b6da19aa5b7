use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Matches the `[parameters('name')]` indirection used by initiative member
/// parameter values and parameterized policy effects.
static PARAM_BINDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[parameters\('([^']+)'\)\]$").expect("valid binding regex"));

/// Last segment of an ARM-style resource path, or the input itself when it
/// is already a bare id. Empty input stays empty.
pub fn extract_definition_id(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Scope-independent metadata for a single policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyDefinition {
    /// Definition id (UUID or symbolic name)
    pub id: String,

    pub display_name: String,
    pub description: String,
    pub category: String,
    pub version: String,

    /// "BuiltIn" / "Custom"
    pub policy_type: String,

    /// Resolved effect: the rule's `then.effect`, with a parameterized
    /// effect followed to its parameter's default value
    pub effect: String,

    /// Parameter schema defaults (only parameters that declare one)
    pub parameter_defaults: BTreeMap<String, Value>,

    /// All declared parameter names, for display
    pub parameter_names: Vec<String>,
}

/// One member parameter value inside an initiative definition: either a
/// literal default, or a binding to one of the initiative's own parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemberParam {
    Literal(Value),
    Binding(String),
}

impl MemberParam {
    /// Classify a raw member parameter value.
    pub fn from_value(value: Value) -> Self {
        if let Value::String(s) = &value {
            if let Some(caps) = PARAM_BINDING.captures(s) {
                return MemberParam::Binding(caps[1].to_string());
            }
        }
        MemberParam::Literal(value)
    }
}

/// One member-policy entry of an initiative definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiativeMember {
    /// Extracted member policy id
    pub policy_id: String,

    /// Member parameter map: parameter name -> default or binding
    pub parameters: BTreeMap<String, MemberParam>,
}

/// Scope-independent metadata for an initiative (a named policy bundle).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitiativeDefinition {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub category: String,
    pub version: String,
    pub policy_type: String,

    /// Member count as stated by the document; may disagree with the
    /// parsed member list (flagged downstream, parsed list wins)
    pub declared_count: Option<usize>,

    /// Ordered member entries
    pub members: Vec<InitiativeMember>,
}

/// A fetched definition, either kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Definition {
    Policy(PolicyDefinition),
    Initiative(InitiativeDefinition),
}

impl Definition {
    pub fn id(&self) -> &str {
        match self {
            Definition::Policy(p) => &p.id,
            Definition::Initiative(i) => &i.id,
        }
    }
}

use crate::error::Result;
use catalog_model::{
    EnforcementMode, ParentInitiative, ResolvedInitiative, ResolvedPolicy, ScopedKey,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const INITIATIVES_FILE: &str = "initiatives.csv";
pub const DIRECT_POLICIES_FILE: &str = "direct_policies.csv";
pub const INITIATIVE_POLICIES_FILE: &str = "initiative_policies.csv";
pub const BREAKDOWN_FILE: &str = "breakdown.csv";

pub(crate) const INCLUDE_YES: &str = "Yes";
pub(crate) const INCLUDE_NO: &str = "No";

// Header rows are written explicitly so a table with zero data rows still
// carries its column names (the csv writer only emits serde-derived headers
// once a first record exists).
pub(crate) const INITIATIVE_HEADERS: &[&str] = &[
    "assignment_name",
    "initiative_id",
    "display_name",
    "scope",
    "enforcement_mode",
    "member_count",
    "category",
    "version",
    "unresolved",
    "count_mismatch",
    "definition_link",
    "assignment_link",
    "include",
];

pub(crate) const DIRECT_POLICY_HEADERS: &[&str] = &[
    "policy_id",
    "display_name",
    "effect",
    "parameters",
    "assignment_name",
    "scope",
    "category",
    "unresolved",
    "definition_link",
    "include",
];

pub(crate) const MEMBER_POLICY_HEADERS: &[&str] = &[
    "policy_id",
    "display_name",
    "effect",
    "parameters",
    "initiative_id",
    "initiative_display_name",
    "assignment_name",
    "scope",
    "category",
    "unresolved",
    "definition_link",
];

pub(crate) const BREAKDOWN_HEADERS: &[&str] = &[
    "scope",
    "assignment_name",
    "policy_id",
    "display_name",
    "effect",
    "parameters",
    "category",
    "initiative_id",
];

/// One row of `initiatives.csv`.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct InitiativeRow {
    pub assignment_name: String,
    pub initiative_id: String,
    pub display_name: String,
    pub scope: String,
    pub enforcement_mode: String,
    pub member_count: usize,
    pub category: String,
    pub version: String,
    pub unresolved: bool,
    pub count_mismatch: bool,
    pub definition_link: String,
    pub assignment_link: String,
    pub include: String,
}

impl InitiativeRow {
    pub fn from_resolved(init: &ResolvedInitiative, included: bool) -> Self {
        Self {
            assignment_name: init.assignment_name.clone(),
            initiative_id: init.initiative_id.clone(),
            display_name: init.display_name.clone(),
            scope: init.scope.clone(),
            enforcement_mode: init.enforcement_mode.as_str().to_string(),
            member_count: init.member_count,
            category: init.category.clone(),
            version: init.version.clone(),
            unresolved: init.unresolved,
            count_mismatch: init.count_mismatch,
            definition_link: init.reference_url.clone(),
            assignment_link: init.assignment_url.clone(),
            include: include_flag(included),
        }
    }

    pub fn scoped_key(&self) -> ScopedKey {
        ScopedKey::new(self.initiative_id.clone(), self.scope.clone())
    }

    pub fn included(&self) -> bool {
        is_included(&self.include)
    }

    /// Rebuild the shell of a resolved initiative; members are re-attached
    /// from the member table by the reader.
    pub fn into_resolved(self) -> ResolvedInitiative {
        ResolvedInitiative {
            initiative_id: self.initiative_id,
            display_name: self.display_name,
            category: self.category,
            version: self.version,
            scope: self.scope,
            assignment_name: self.assignment_name,
            enforcement_mode: EnforcementMode::parse(Some(&self.enforcement_mode)),
            member_count: self.member_count,
            members: Vec::new(),
            unresolved: self.unresolved,
            count_mismatch: self.count_mismatch,
            reference_url: self.definition_link,
            assignment_url: self.assignment_link,
        }
    }
}

/// One row of `direct_policies.csv`.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DirectPolicyRow {
    pub policy_id: String,
    pub display_name: String,
    pub effect: String,
    pub parameters: String,
    pub assignment_name: String,
    pub scope: String,
    pub category: String,
    pub unresolved: bool,
    pub definition_link: String,
    pub include: String,
}

impl DirectPolicyRow {
    pub fn from_resolved(policy: &ResolvedPolicy, included: bool) -> Result<Self> {
        Ok(Self {
            policy_id: policy.policy_id.clone(),
            display_name: policy.display_name.clone(),
            effect: policy.effect.clone(),
            parameters: encode_parameters(&policy.effective_parameters)?,
            assignment_name: policy.assignment_name.clone(),
            scope: policy.scope.clone(),
            category: policy.category.clone(),
            unresolved: policy.unresolved,
            definition_link: policy.reference_url.clone(),
            include: include_flag(included),
        })
    }

    pub fn scoped_key(&self) -> ScopedKey {
        ScopedKey::new(self.policy_id.clone(), self.scope.clone())
    }

    pub fn included(&self) -> bool {
        is_included(&self.include)
    }

    pub fn into_resolved(self) -> Result<ResolvedPolicy> {
        Ok(ResolvedPolicy {
            policy_id: self.policy_id,
            display_name: self.display_name,
            category: self.category,
            effect: self.effect,
            scope: self.scope,
            assignment_name: self.assignment_name,
            parent: None,
            effective_parameters: decode_parameters(&self.parameters)?,
            unresolved: self.unresolved,
            reference_url: self.definition_link,
        })
    }
}

/// One row of `initiative_policies.csv`.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MemberPolicyRow {
    pub policy_id: String,
    pub display_name: String,
    pub effect: String,
    pub parameters: String,
    pub initiative_id: String,
    pub initiative_display_name: String,
    pub assignment_name: String,
    pub scope: String,
    pub category: String,
    pub unresolved: bool,
    pub definition_link: String,
}

impl MemberPolicyRow {
    pub fn from_resolved(policy: &ResolvedPolicy) -> Result<Self> {
        let parent = policy.parent.clone().unwrap_or(ParentInitiative {
            id: String::new(),
            display_name: String::new(),
        });
        Ok(Self {
            policy_id: policy.policy_id.clone(),
            display_name: policy.display_name.clone(),
            effect: policy.effect.clone(),
            parameters: encode_parameters(&policy.effective_parameters)?,
            initiative_id: parent.id,
            initiative_display_name: parent.display_name,
            assignment_name: policy.assignment_name.clone(),
            scope: policy.scope.clone(),
            category: policy.category.clone(),
            unresolved: policy.unresolved,
            definition_link: policy.reference_url.clone(),
        })
    }

    /// Scope-aware key of the parent initiative instance this row belongs to.
    pub fn parent_key(&self) -> ScopedKey {
        ScopedKey::new(self.initiative_id.clone(), self.scope.clone())
    }

    pub fn into_resolved(self) -> Result<ResolvedPolicy> {
        Ok(ResolvedPolicy {
            policy_id: self.policy_id,
            display_name: self.display_name,
            category: self.category,
            effect: self.effect,
            scope: self.scope,
            assignment_name: self.assignment_name,
            parent: Some(ParentInitiative {
                id: self.initiative_id,
                display_name: self.initiative_display_name,
            }),
            effective_parameters: decode_parameters(&self.parameters)?,
            unresolved: self.unresolved,
            reference_url: self.definition_link,
        })
    }
}

/// One row of `breakdown.csv`. Output only; the table is always re-derived
/// from the other three plus the include flags.
#[derive(Debug, Serialize)]
pub(crate) struct BreakdownRow {
    pub scope: String,
    pub assignment_name: String,
    pub policy_id: String,
    pub display_name: String,
    pub effect: String,
    pub parameters: String,
    pub category: String,
    pub initiative_id: String,
}

impl BreakdownRow {
    pub fn from_resolved(policy: &ResolvedPolicy) -> Result<Self> {
        Ok(Self {
            scope: policy.scope.clone(),
            assignment_name: policy.assignment_name.clone(),
            policy_id: policy.policy_id.clone(),
            display_name: policy.display_name.clone(),
            effect: policy.effect.clone(),
            parameters: encode_parameters(&policy.effective_parameters)?,
            category: policy.category.clone(),
            initiative_id: policy
                .parent
                .as_ref()
                .map(|p| p.id.clone())
                .unwrap_or_default(),
        })
    }
}

fn include_flag(included: bool) -> String {
    if included { INCLUDE_YES } else { INCLUDE_NO }.to_string()
}

fn is_included(flag: &str) -> bool {
    flag.trim().eq_ignore_ascii_case(INCLUDE_YES)
}

/// Effective parameters travel as canonical JSON in one cell. A `BTreeMap`
/// keeps the encoding deterministic.
fn encode_parameters(parameters: &BTreeMap<String, Value>) -> Result<String> {
    if parameters.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(parameters)?)
}

fn decode_parameters(cell: &str) -> Result<BTreeMap<String, Value>> {
    if cell.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(cell)?)
}

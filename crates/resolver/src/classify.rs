use crate::error::ClassifyError;
use catalog_model::{extract_definition_id, Assignment, EnforcementMode, RawAssignment, TargetKind};

/// Path segment marking an initiative target.
const INITIATIVE_MARKER: &str = "policySetDefinitions";

/// Classify one raw assignment declared at `scope`.
///
/// An explicit kind discriminator on the document wins. Otherwise the target
/// path shape decides: a `policySetDefinitions` segment means initiative,
/// anything else with a non-empty id (including a bare UUID or symbolic
/// name) classifies as a policy. A missing id is the only failure; such
/// records are skipped and reported by the pipeline, never fatal.
pub fn classify(raw: &RawAssignment, scope: &str) -> Result<Assignment, ClassifyError> {
    let target_id = extract_definition_id(&raw.target_id);
    if target_id.is_empty() {
        return Err(ClassifyError::MissingTarget {
            scope: scope.to_string(),
            assignment: raw.name.clone(),
        });
    }

    let kind = match raw.kind_hint {
        Some(kind) => kind,
        None if raw.target_id.contains(INITIATIVE_MARKER) => TargetKind::Initiative,
        None => TargetKind::Policy,
    };

    let display_name = raw
        .display_name
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| raw.name.clone());

    Ok(Assignment {
        name: raw.name.clone(),
        display_name,
        kind,
        target_id: target_id.to_string(),
        enforcement_mode: EnforcementMode::parse(raw.enforcement_mode.as_deref()),
        scope: scope.to_string(),
        overrides: raw.overrides.clone(),
        source_url: raw.source_url.clone(),
    })
}

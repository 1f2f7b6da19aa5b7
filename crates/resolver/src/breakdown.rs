use catalog_model::{ResolvedInitiative, ResolvedPolicy, ScopedKey, SelectionSet};
use std::collections::HashMap;

/// Compose the breakdown view for a selection: the union of member policies
/// of every included initiative plus every included direct policy,
/// deduplicated by (policy id, scope).
///
/// Two reachability paths to the same policy under the same scope collapse
/// to one row (the richer one); the same policy under two different scopes
/// stays one row per scope. Pure: no fetches, no recursion.
///
/// Ordering is stable and deterministic: scope, then originating assignment
/// name, then policy display name.
pub fn compose_breakdown(
    initiatives: &[ResolvedInitiative],
    direct_policies: &[ResolvedPolicy],
    selection: &SelectionSet,
) -> Vec<ResolvedPolicy> {
    let mut by_key: HashMap<ScopedKey, ResolvedPolicy> = HashMap::new();

    let reachable = initiatives
        .iter()
        .filter(|init| selection.initiatives.contains(&init.scoped_key()))
        .flat_map(|init| init.members.iter())
        .chain(
            direct_policies
                .iter()
                .filter(|policy| selection.direct_policies.contains(&policy.scoped_key())),
        );

    for policy in reachable {
        let key = policy.scoped_key();
        match by_key.get(&key) {
            Some(existing) if existing.unresolved_weight() <= policy.unresolved_weight() => {}
            _ => {
                by_key.insert(key, policy.clone());
            }
        }
    }

    let mut out: Vec<ResolvedPolicy> = by_key.into_values().collect();
    out.sort_by(|a, b| {
        (&a.scope, &a.assignment_name, &a.display_name, &a.policy_id).cmp(&(
            &b.scope,
            &b.assignment_name,
            &b.display_name,
            &b.policy_id,
        ))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::compose_breakdown;
    use catalog_model::{
        EnforcementMode, ParentInitiative, ResolvedInitiative, ResolvedPolicy, ScopedKey,
        SelectionSet,
    };
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn member(policy_id: &str, scope: &str, parent_id: &str) -> ResolvedPolicy {
        ResolvedPolicy {
            policy_id: policy_id.to_string(),
            display_name: policy_id.to_string(),
            category: String::new(),
            effect: "Audit".to_string(),
            scope: scope.to_string(),
            assignment_name: format!("Assign-{parent_id}"),
            parent: Some(ParentInitiative {
                id: parent_id.to_string(),
                display_name: parent_id.to_string(),
            }),
            effective_parameters: BTreeMap::new(),
            unresolved: false,
            reference_url: String::new(),
        }
    }

    fn direct(policy_id: &str, scope: &str) -> ResolvedPolicy {
        ResolvedPolicy {
            parent: None,
            assignment_name: format!("Assign-{policy_id}"),
            ..member(policy_id, scope, "unused")
        }
    }

    fn initiative(id: &str, scope: &str, members: Vec<ResolvedPolicy>) -> ResolvedInitiative {
        ResolvedInitiative {
            initiative_id: id.to_string(),
            display_name: id.to_string(),
            category: String::new(),
            version: String::new(),
            scope: scope.to_string(),
            assignment_name: format!("Assign-{id}"),
            enforcement_mode: EnforcementMode::Default,
            member_count: members.len(),
            members,
            unresolved: false,
            count_mismatch: false,
            reference_url: String::new(),
            assignment_url: String::new(),
        }
    }

    #[test]
    fn dedups_within_scope_across_paths() {
        // POL-1 reachable at S1 both directly and via INIT-B.
        let initiatives = vec![initiative("INIT-B", "S1", vec![member("POL-1", "S1", "INIT-B")])];
        let directs = vec![direct("POL-1", "S1")];
        let mut selection = SelectionSet::default();
        selection.include_initiative(ScopedKey::new("INIT-B", "S1"));
        selection.include_direct_policy(ScopedKey::new("POL-1", "S1"));

        let out = compose_breakdown(&initiatives, &directs, &selection);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].policy_id, "POL-1");
        assert_eq!(out[0].scope, "S1");
    }

    #[test]
    fn does_not_collapse_across_scopes() {
        // Same policy, but the initiative contributes it at S2.
        let initiatives = vec![initiative("INIT-B", "S2", vec![member("POL-1", "S2", "INIT-B")])];
        let directs = vec![direct("POL-1", "S1")];
        let mut selection = SelectionSet::default();
        selection.include_initiative(ScopedKey::new("INIT-B", "S2"));
        selection.include_direct_policy(ScopedKey::new("POL-1", "S1"));

        let out = compose_breakdown(&initiatives, &directs, &selection);
        let pairs: Vec<(&str, &str)> = out
            .iter()
            .map(|p| (p.policy_id.as_str(), p.scope.as_str()))
            .collect();
        assert_eq!(pairs, vec![("POL-1", "S1"), ("POL-1", "S2")]);
    }

    #[test]
    fn selection_is_scope_specific() {
        // INIT-B exists at S1 and S2 but only S1 is included.
        let initiatives = vec![
            initiative("INIT-B", "S1", vec![member("POL-1", "S1", "INIT-B")]),
            initiative("INIT-B", "S2", vec![member("POL-1", "S2", "INIT-B")]),
        ];
        let mut selection = SelectionSet::default();
        selection.include_initiative(ScopedKey::new("INIT-B", "S1"));

        let out = compose_breakdown(&initiatives, &[], &selection);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].scope, "S1");
    }

    #[test]
    fn shared_member_of_two_selected_initiatives_appears_once() {
        let initiatives = vec![
            initiative("INIT-B", "S1", vec![member("POL-1", "S1", "INIT-B")]),
            initiative("INIT-C", "S1", vec![member("POL-1", "S1", "INIT-C")]),
        ];
        let mut selection = SelectionSet::default();
        selection.include_initiative(ScopedKey::new("INIT-B", "S1"));
        selection.include_initiative(ScopedKey::new("INIT-C", "S1"));

        let out = compose_breakdown(&initiatives, &[], &selection);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn empty_selection_yields_empty_breakdown() {
        let initiatives = vec![initiative("INIT-B", "S1", vec![member("POL-1", "S1", "INIT-B")])];
        let out = compose_breakdown(&initiatives, &[], &SelectionSet::default());
        assert!(out.is_empty());
    }

    #[test]
    fn ordering_is_scope_then_assignment_then_display_name() {
        let initiatives = vec![
            initiative(
                "INIT-Z",
                "S2",
                vec![member("POL-9", "S2", "INIT-Z"), member("POL-1", "S2", "INIT-Z")],
            ),
            initiative("INIT-A", "S1", vec![member("POL-5", "S1", "INIT-A")]),
        ];
        let mut selection = SelectionSet::default();
        selection.include_initiative(ScopedKey::new("INIT-Z", "S2"));
        selection.include_initiative(ScopedKey::new("INIT-A", "S1"));

        let out = compose_breakdown(&initiatives, &[], &selection);
        let ids: Vec<&str> = out.iter().map(|p| p.policy_id.as_str()).collect();
        assert_eq!(ids, vec!["POL-5", "POL-1", "POL-9"]);
    }
}

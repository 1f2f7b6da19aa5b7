use catalog_model::{ResolvedInitiative, ResolvedPolicy, ScopedKey};
use std::collections::HashMap;

/// Collapse initiative instances that share a scope-aware identity,
/// preferring the occurrence with fewer unresolved facts. Instances of the
/// same initiative at distinct scopes are never collapsed: the analyst must
/// see both assignments independently.
///
/// Output is sorted by (scope, assignment name, display name) so repeated
/// runs over unchanged input are byte-identical downstream.
pub fn dedupe_initiatives(items: Vec<ResolvedInitiative>) -> Vec<ResolvedInitiative> {
    let mut by_key: HashMap<ScopedKey, ResolvedInitiative> = HashMap::new();
    for item in items {
        let key = item.scoped_key();
        match by_key.get(&key) {
            Some(existing) if existing.unresolved_weight() <= item.unresolved_weight() => {
                log::debug!("Dropping duplicate initiative occurrence {key}");
            }
            _ => {
                by_key.insert(key, item);
            }
        }
    }
    let mut out: Vec<ResolvedInitiative> = by_key.into_values().collect();
    out.sort_by(|a, b| {
        (&a.scope, &a.assignment_name, &a.display_name).cmp(&(
            &b.scope,
            &b.assignment_name,
            &b.display_name,
        ))
    });
    out
}

/// Collapse direct policy instances sharing a scope-aware identity, same
/// preference rule and ordering as [`dedupe_initiatives`].
pub fn dedupe_policies(items: Vec<ResolvedPolicy>) -> Vec<ResolvedPolicy> {
    let mut by_key: HashMap<ScopedKey, ResolvedPolicy> = HashMap::new();
    for item in items {
        let key = item.scoped_key();
        match by_key.get(&key) {
            Some(existing) if existing.unresolved_weight() <= item.unresolved_weight() => {
                log::debug!("Dropping duplicate policy occurrence {key}");
            }
            _ => {
                by_key.insert(key, item);
            }
        }
    }
    sort_policies(by_key.into_values().collect())
}

/// Dedup for the initiative-expanded listing. Keyed by (parent initiative,
/// policy, scope): two initiatives at the same scope sharing a member keep
/// one row each, because each row documents a distinct expansion path.
pub fn dedupe_member_policies(items: Vec<ResolvedPolicy>) -> Vec<ResolvedPolicy> {
    let mut by_key: HashMap<(String, ScopedKey), ResolvedPolicy> = HashMap::new();
    for item in items {
        let parent_id = item
            .parent
            .as_ref()
            .map(|p| p.id.clone())
            .unwrap_or_default();
        let key = (parent_id, item.scoped_key());
        match by_key.get(&key) {
            Some(existing) if existing.unresolved_weight() <= item.unresolved_weight() => {}
            _ => {
                by_key.insert(key, item);
            }
        }
    }
    sort_policies(by_key.into_values().collect())
}

fn sort_policies(mut items: Vec<ResolvedPolicy>) -> Vec<ResolvedPolicy> {
    items.sort_by(|a, b| {
        (&a.scope, &a.assignment_name, &a.display_name, &a.policy_id).cmp(&(
            &b.scope,
            &b.assignment_name,
            &b.display_name,
            &b.policy_id,
        ))
    });
    items
}

use catalog_model::{
    Assignment, Definition, DefinitionSource, Fetched, InitiativeDefinition, InitiativeMember,
    LinkBuilder, MemberParam, ParentInitiative, PolicyDefinition, ResolvedInitiative,
    ResolvedPolicy, TargetKind,
};
use serde_json::Value;
use std::cell::Cell;
use std::collections::BTreeMap;

/// Expands initiative assignments into their member policies and resolves
/// direct policy assignments, merging parameters along the way.
///
/// Expansion is exactly one level deep by domain rule: initiatives cannot
/// nest other initiatives in this model. A member id that turns out to
/// resolve to an initiative is emitted as an unresolved policy row instead
/// of recursing.
pub struct Expander<'a, S: DefinitionSource, L: LinkBuilder> {
    source: &'a S,
    links: &'a L,
    fetch_failures: Cell<usize>,
}

impl<'a, S: DefinitionSource, L: LinkBuilder> Expander<'a, S, L> {
    pub fn new(source: &'a S, links: &'a L) -> Self {
        Self {
            source,
            links,
            fetch_failures: Cell::new(0),
        }
    }

    /// Transient fetch failures degraded to not-found so far.
    pub fn fetch_failures(&self) -> usize {
        self.fetch_failures.get()
    }

    /// Fetch a definition, degrading transient failures to `NotFound`.
    fn fetch_degraded(&self, id: &str, kind: TargetKind) -> Fetched {
        match self.source.fetch(id, kind) {
            Ok(fetched) => fetched,
            Err(err) => {
                log::warn!("{err}; treating as not found");
                self.fetch_failures.set(self.fetch_failures.get() + 1);
                Fetched::NotFound
            }
        }
    }

    /// Expand one initiative assignment into a [`ResolvedInitiative`].
    ///
    /// A missing initiative definition yields a flagged instance with zero
    /// members: the assignment existed and must appear in listings.
    pub fn expand_initiative(&self, assignment: &Assignment) -> ResolvedInitiative {
        debug_assert_eq!(assignment.kind, TargetKind::Initiative);

        let definition = match self.fetch_degraded(&assignment.target_id, TargetKind::Initiative) {
            Fetched::Found(Definition::Initiative(def)) => def,
            Fetched::Found(Definition::Policy(_)) | Fetched::NotFound => {
                log::warn!(
                    "Initiative definition '{}' not resolvable; emitting flagged empty instance",
                    assignment.target_id
                );
                return self.unresolved_initiative(assignment);
            }
        };

        let count_mismatch = definition
            .declared_count
            .is_some_and(|declared| declared != definition.members.len());
        if count_mismatch {
            log::warn!(
                "Initiative '{}' declares {} members but the parsed list has {}; using the parsed list",
                definition.id,
                definition.declared_count.unwrap_or(0),
                definition.members.len()
            );
        }

        let parent = ParentInitiative {
            id: definition.id.clone(),
            display_name: definition.display_name.clone(),
        };
        let members: Vec<ResolvedPolicy> = definition
            .members
            .iter()
            .map(|member| self.resolve_member(assignment, &definition, &parent, member))
            .collect();

        ResolvedInitiative {
            initiative_id: definition.id.clone(),
            display_name: definition.display_name.clone(),
            category: definition.category.clone(),
            version: definition.version.clone(),
            scope: assignment.scope.clone(),
            assignment_name: assignment.name.clone(),
            enforcement_mode: assignment.enforcement_mode,
            member_count: members.len(),
            members,
            unresolved: false,
            count_mismatch,
            reference_url: self
                .links
                .definition_url(&definition.id, TargetKind::Initiative),
            assignment_url: self.assignment_link(assignment),
        }
    }

    /// Resolve a direct (non-initiative) policy assignment.
    ///
    /// Effective parameters: the definition's defaults lowest, the
    /// assignment's own overrides highest. Unknown override keys pass
    /// through; the definition schema may be incomplete.
    pub fn resolve_direct(&self, assignment: &Assignment) -> ResolvedPolicy {
        debug_assert_eq!(assignment.kind, TargetKind::Policy);

        let definition = match self.fetch_degraded(&assignment.target_id, TargetKind::Policy) {
            Fetched::Found(Definition::Policy(def)) => def,
            Fetched::Found(Definition::Initiative(_)) | Fetched::NotFound => {
                return self.placeholder_policy(assignment, &assignment.target_id, None);
            }
        };

        let mut effective = definition.parameter_defaults.clone();
        for (key, value) in &assignment.overrides {
            effective.insert(key.clone(), value.clone());
        }

        ResolvedPolicy {
            policy_id: definition.id.clone(),
            display_name: definition.display_name.clone(),
            category: definition.category.clone(),
            effect: definition.effect.clone(),
            scope: assignment.scope.clone(),
            assignment_name: assignment.name.clone(),
            parent: None,
            effective_parameters: effective,
            unresolved: false,
            reference_url: self.links.definition_url(&definition.id, TargetKind::Policy),
        }
    }

    /// Resolve one member entry of an initiative definition.
    fn resolve_member(
        &self,
        assignment: &Assignment,
        initiative: &InitiativeDefinition,
        parent: &ParentInitiative,
        member: &InitiativeMember,
    ) -> ResolvedPolicy {
        let definition = match self.fetch_degraded(&member.policy_id, TargetKind::Policy) {
            Fetched::Found(Definition::Policy(def)) => def,
            Fetched::Found(Definition::Initiative(_)) => {
                // Closed domain rule: expansion stops at one level, so a
                // nested initiative is surfaced as an unresolved policy row.
                log::warn!(
                    "Member '{}' of initiative '{}' is itself an initiative; not recursing",
                    member.policy_id,
                    initiative.id
                );
                return self.placeholder_policy(assignment, &member.policy_id, Some(parent.clone()));
            }
            Fetched::NotFound => {
                return self.placeholder_policy(assignment, &member.policy_id, Some(parent.clone()));
            }
        };

        let effective = merge_member_parameters(member, &assignment.overrides, &definition);

        ResolvedPolicy {
            policy_id: definition.id.clone(),
            display_name: definition.display_name.clone(),
            category: definition.category.clone(),
            effect: definition.effect.clone(),
            scope: assignment.scope.clone(),
            assignment_name: assignment.name.clone(),
            parent: Some(parent.clone()),
            effective_parameters: effective,
            unresolved: false,
            reference_url: self.links.definition_url(&definition.id, TargetKind::Policy),
        }
    }

    fn unresolved_initiative(&self, assignment: &Assignment) -> ResolvedInitiative {
        ResolvedInitiative {
            initiative_id: assignment.target_id.clone(),
            display_name: assignment.target_id.clone(),
            category: String::new(),
            version: String::new(),
            scope: assignment.scope.clone(),
            assignment_name: assignment.name.clone(),
            enforcement_mode: assignment.enforcement_mode,
            member_count: 0,
            members: Vec::new(),
            unresolved: true,
            count_mismatch: false,
            reference_url: self
                .links
                .definition_url(&assignment.target_id, TargetKind::Initiative),
            assignment_url: self.assignment_link(assignment),
        }
    }

    /// Row carrying only the identifier, for members and targets whose
    /// definition could not be resolved. Still counted.
    fn placeholder_policy(
        &self,
        assignment: &Assignment,
        policy_id: &str,
        parent: Option<ParentInitiative>,
    ) -> ResolvedPolicy {
        let effective = if parent.is_none() {
            // Direct assignments keep their own overrides even without a
            // schema to merge against.
            assignment.overrides.clone()
        } else {
            BTreeMap::new()
        };
        ResolvedPolicy {
            policy_id: policy_id.to_string(),
            display_name: policy_id.to_string(),
            category: String::new(),
            effect: String::new(),
            scope: assignment.scope.clone(),
            assignment_name: assignment.name.clone(),
            parent,
            effective_parameters: effective,
            unresolved: true,
            reference_url: self.links.definition_url(policy_id, TargetKind::Policy),
        }
    }

    fn assignment_link(&self, assignment: &Assignment) -> String {
        assignment
            .source_url
            .clone()
            .unwrap_or_else(|| self.links.assignment_url(&assignment.scope, &assignment.name))
    }
}

/// Merge effective parameters for one initiative member, lowest precedence
/// first:
///
/// 1. the member's literal defaults declared inside the initiative,
/// 2. for a member value bound to one of the initiative's own parameters,
///    the assignment-level override for that parameter, falling back to the
///    member policy's schema default when no override targets it.
///
/// Overrides whose key matches no member binding are ignored for this
/// member; they belong to other members of the same initiative.
fn merge_member_parameters(
    member: &InitiativeMember,
    overrides: &BTreeMap<String, Value>,
    policy: &PolicyDefinition,
) -> BTreeMap<String, Value> {
    let mut effective = BTreeMap::new();
    for (name, param) in &member.parameters {
        match param {
            MemberParam::Literal(value) => {
                effective.insert(name.clone(), value.clone());
            }
            MemberParam::Binding(bound) => {
                if let Some(value) = overrides.get(bound) {
                    effective.insert(name.clone(), value.clone());
                } else if let Some(default) = policy.parameter_defaults.get(name) {
                    effective.insert(name.clone(), default.clone());
                }
            }
        }
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::Expander;
    use catalog_model::{
        Assignment, Definition, DefinitionSource, EnforcementMode, Fetched, InitiativeDefinition,
        InitiativeMember, MemberParam, NoLinks, PolicyDefinition, SourceError, TargetKind,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    /// In-memory definition source for core tests.
    #[derive(Default)]
    struct StubSource {
        definitions: HashMap<String, Definition>,
        failing: Vec<String>,
    }

    impl StubSource {
        fn with_policy(mut self, def: PolicyDefinition) -> Self {
            self.definitions.insert(def.id.clone(), Definition::Policy(def));
            self
        }

        fn with_initiative(mut self, def: InitiativeDefinition) -> Self {
            self.definitions
                .insert(def.id.clone(), Definition::Initiative(def));
            self
        }

        fn failing_on(mut self, id: &str) -> Self {
            self.failing.push(id.to_string());
            self
        }
    }

    impl DefinitionSource for StubSource {
        fn fetch(&self, id: &str, _kind: TargetKind) -> catalog_model::Result<Fetched> {
            if self.failing.iter().any(|f| f == id) {
                return Err(SourceError::new(id, "stub failure"));
            }
            Ok(self
                .definitions
                .get(id)
                .cloned()
                .map(Fetched::Found)
                .unwrap_or(Fetched::NotFound))
        }
    }

    fn policy(id: &str, effect: &str) -> PolicyDefinition {
        PolicyDefinition {
            id: id.to_string(),
            display_name: format!("{id} display"),
            effect: effect.to_string(),
            category: "Security".to_string(),
            ..PolicyDefinition::default()
        }
    }

    fn initiative_assignment(target: &str, scope: &str) -> Assignment {
        Assignment {
            name: "Assign-Init".to_string(),
            display_name: "Assign-Init".to_string(),
            kind: TargetKind::Initiative,
            target_id: target.to_string(),
            enforcement_mode: EnforcementMode::Default,
            scope: scope.to_string(),
            overrides: BTreeMap::new(),
            source_url: None,
        }
    }

    fn member(policy_id: &str, params: Vec<(&str, MemberParam)>) -> InitiativeMember {
        InitiativeMember {
            policy_id: policy_id.to_string(),
            parameters: params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn override_beats_member_default() {
        let init = InitiativeDefinition {
            id: "INIT-B".to_string(),
            display_name: "Initiative B".to_string(),
            declared_count: Some(1),
            members: vec![member(
                "POL-1",
                vec![
                    ("effect", MemberParam::Literal(json!("Audit"))),
                    ("effectBinding", MemberParam::Binding("polOneEffect".to_string())),
                ],
            )],
            ..InitiativeDefinition::default()
        };
        // The member declares both a literal default and a bound parameter;
        // the assignment overrides the bound one.
        let source = StubSource::default()
            .with_initiative(init)
            .with_policy(policy("POL-1", "Audit"));
        let mut assignment = initiative_assignment("INIT-B", "corp");
        assignment
            .overrides
            .insert("polOneEffect".to_string(), json!("Deny"));

        let expander = Expander::new(&source, &NoLinks);
        let resolved = expander.expand_initiative(&assignment);

        assert_eq!(resolved.member_count, 1);
        let params = &resolved.members[0].effective_parameters;
        assert_eq!(params.get("effect"), Some(&json!("Audit")));
        assert_eq!(params.get("effectBinding"), Some(&json!("Deny")));
    }

    #[test]
    fn unbound_binding_falls_back_to_policy_default() {
        let init = InitiativeDefinition {
            id: "INIT-C".to_string(),
            members: vec![member(
                "POL-2",
                vec![("retention", MemberParam::Binding("logRetention".to_string()))],
            )],
            ..InitiativeDefinition::default()
        };
        let mut pol = policy("POL-2", "Audit");
        pol.parameter_defaults
            .insert("retention".to_string(), json!(30));
        let source = StubSource::default().with_initiative(init).with_policy(pol);

        let expander = Expander::new(&source, &NoLinks);
        let resolved = expander.expand_initiative(&initiative_assignment("INIT-C", "corp"));

        assert_eq!(
            resolved.members[0].effective_parameters.get("retention"),
            Some(&json!(30))
        );
    }

    #[test]
    fn missing_member_definition_emits_flagged_placeholder() {
        let init = InitiativeDefinition {
            id: "INIT-D".to_string(),
            declared_count: Some(2),
            members: vec![member("POL-OK", vec![]), member("POL-MISSING", vec![])],
            ..InitiativeDefinition::default()
        };
        let source = StubSource::default()
            .with_initiative(init)
            .with_policy(policy("POL-OK", "Deny"));

        let expander = Expander::new(&source, &NoLinks);
        let resolved = expander.expand_initiative(&initiative_assignment("INIT-D", "corp"));

        assert_eq!(resolved.member_count, 2);
        assert_eq!(resolved.member_count, resolved.members.len());
        let missing = &resolved.members[1];
        assert!(missing.unresolved);
        assert_eq!(missing.display_name, "POL-MISSING");
        assert!(!resolved.count_mismatch);
    }

    #[test]
    fn missing_initiative_definition_emits_flagged_empty_instance() {
        let source = StubSource::default();
        let expander = Expander::new(&source, &NoLinks);
        let resolved = expander.expand_initiative(&initiative_assignment("INIT-GONE", "corp"));

        assert!(resolved.unresolved);
        assert_eq!(resolved.member_count, 0);
        assert!(resolved.members.is_empty());
        assert_eq!(resolved.display_name, "INIT-GONE");
        assert_eq!(resolved.scope, "corp");
    }

    #[test]
    fn nested_initiative_member_is_flagged_not_recursed() {
        let inner = InitiativeDefinition {
            id: "INIT-INNER".to_string(),
            members: vec![member("POL-DEEP", vec![])],
            ..InitiativeDefinition::default()
        };
        let outer = InitiativeDefinition {
            id: "INIT-OUTER".to_string(),
            members: vec![member("INIT-INNER", vec![])],
            ..InitiativeDefinition::default()
        };
        let source = StubSource::default()
            .with_initiative(inner)
            .with_initiative(outer);

        let expander = Expander::new(&source, &NoLinks);
        let resolved = expander.expand_initiative(&initiative_assignment("INIT-OUTER", "corp"));

        assert_eq!(resolved.member_count, 1);
        assert!(resolved.members[0].unresolved);
        assert_eq!(resolved.members[0].policy_id, "INIT-INNER");
    }

    #[test]
    fn declared_count_mismatch_is_flagged_parsed_list_wins() {
        let init = InitiativeDefinition {
            id: "INIT-E".to_string(),
            declared_count: Some(5),
            members: vec![member("POL-OK", vec![])],
            ..InitiativeDefinition::default()
        };
        let source = StubSource::default()
            .with_initiative(init)
            .with_policy(policy("POL-OK", "Audit"));

        let expander = Expander::new(&source, &NoLinks);
        let resolved = expander.expand_initiative(&initiative_assignment("INIT-E", "corp"));

        assert!(resolved.count_mismatch);
        assert_eq!(resolved.member_count, 1);
    }

    #[test]
    fn transient_failure_degrades_to_not_found_and_is_counted() {
        let source = StubSource::default().failing_on("INIT-FLAKY");
        let expander = Expander::new(&source, &NoLinks);
        let resolved = expander.expand_initiative(&initiative_assignment("INIT-FLAKY", "corp"));

        assert!(resolved.unresolved);
        assert_eq!(expander.fetch_failures(), 1);
    }

    #[test]
    fn direct_resolution_merges_overrides_over_defaults() {
        let mut pol = policy("POL-3", "Audit");
        pol.parameter_defaults
            .insert("effect".to_string(), json!("Audit"));
        let source = StubSource::default().with_policy(pol);

        let assignment = Assignment {
            name: "Assign-Direct".to_string(),
            display_name: "Assign-Direct".to_string(),
            kind: TargetKind::Policy,
            target_id: "POL-3".to_string(),
            enforcement_mode: EnforcementMode::Default,
            scope: "corp".to_string(),
            overrides: [
                ("effect".to_string(), json!("Deny")),
                ("notInSchema".to_string(), json!("kept")),
            ]
            .into_iter()
            .collect(),
            source_url: None,
        };

        let expander = Expander::new(&source, &NoLinks);
        let resolved = expander.resolve_direct(&assignment);

        assert!(!resolved.unresolved);
        assert!(resolved.is_direct());
        assert_eq!(resolved.effective_parameters.get("effect"), Some(&json!("Deny")));
        // Unknown override keys pass through rather than being dropped.
        assert_eq!(
            resolved.effective_parameters.get("notInSchema"),
            Some(&json!("kept"))
        );
    }
}

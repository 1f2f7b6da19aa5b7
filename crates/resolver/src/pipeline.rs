use crate::classify::classify;
use crate::error::{PipelineError, Result};
use crate::expand::Expander;
use crate::identity::{dedupe_initiatives, dedupe_member_policies, dedupe_policies};
use crate::report::{RunReport, SkippedAssignment};
use catalog_model::{
    Archetype, DefinitionSource, LinkBuilder, ResolvedInitiative, ResolvedPolicy, TargetKind,
};

/// Fully resolved, deduplicated catalog for one run.
#[derive(Debug)]
pub struct Catalog {
    /// One row per (initiative, scope), scope-aware
    pub initiatives: Vec<ResolvedInitiative>,

    /// One row per direct (policy, scope), scope-aware
    pub direct_policies: Vec<ResolvedPolicy>,

    /// One row per (initiative, member policy, scope) expansion path
    pub initiative_policies: Vec<ResolvedPolicy>,

    pub report: RunReport,
}

/// Run the full resolution pipeline over the fetched archetypes.
///
/// Classify every raw assignment (unclassifiable ones are skipped and
/// counted), expand initiatives one level, resolve direct policies, then
/// dedupe everything scope-aware. The only fatal case is discovering no
/// archetypes at all.
pub fn run(
    archetypes: &[Archetype],
    source: &impl DefinitionSource,
    links: &impl LinkBuilder,
) -> Result<Catalog> {
    if archetypes.is_empty() {
        return Err(PipelineError::NoArchetypes);
    }

    let mut report = RunReport {
        archetypes: archetypes.len(),
        ..RunReport::default()
    };

    let expander = Expander::new(source, links);
    let mut initiatives = Vec::new();
    let mut direct_policies = Vec::new();

    for archetype in archetypes {
        log::info!(
            "Resolving {} assignment(s) at scope '{}'",
            archetype.assignments.len(),
            archetype.name
        );
        for raw in &archetype.assignments {
            report.assignments_seen += 1;
            let assignment = match classify(raw, &archetype.name) {
                Ok(assignment) => assignment,
                Err(err) => {
                    report.skipped.push(SkippedAssignment {
                        scope: archetype.name.clone(),
                        assignment_name: raw.name.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            match assignment.kind {
                TargetKind::Initiative => {
                    initiatives.push(expander.expand_initiative(&assignment));
                }
                TargetKind::Policy => {
                    direct_policies.push(expander.resolve_direct(&assignment));
                }
            }
        }
    }

    report.fetch_failures = expander.fetch_failures();

    let initiatives = dedupe_initiatives(initiatives);
    let direct_policies = dedupe_policies(direct_policies);
    let initiative_policies = dedupe_member_policies(
        initiatives
            .iter()
            .flat_map(|init| init.members.iter().cloned())
            .collect(),
    );

    report.count_mismatches = initiatives.iter().filter(|i| i.count_mismatch).count();
    report.unresolved_rows = initiatives.iter().filter(|i| i.unresolved).count()
        + direct_policies.iter().filter(|p| p.unresolved).count()
        + initiative_policies.iter().filter(|p| p.unresolved).count();

    Ok(Catalog {
        initiatives,
        direct_policies,
        initiative_policies,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::error::PipelineError;
    use catalog_model::{
        Archetype, Definition, DefinitionSource, Fetched, InitiativeDefinition, InitiativeMember,
        NoLinks, PolicyDefinition, RawAssignment, TargetKind,
    };
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeMap, HashMap};

    struct StubSource {
        definitions: HashMap<String, Definition>,
    }

    impl DefinitionSource for StubSource {
        fn fetch(&self, id: &str, _kind: TargetKind) -> catalog_model::Result<Fetched> {
            Ok(self
                .definitions
                .get(id)
                .cloned()
                .map(Fetched::Found)
                .unwrap_or(Fetched::NotFound))
        }
    }

    fn stub_source() -> StubSource {
        let mut definitions = HashMap::new();
        definitions.insert(
            "POL-1".to_string(),
            Definition::Policy(PolicyDefinition {
                id: "POL-1".to_string(),
                display_name: "Policy One".to_string(),
                effect: "Audit".to_string(),
                ..PolicyDefinition::default()
            }),
        );
        definitions.insert(
            "INIT-A".to_string(),
            Definition::Initiative(InitiativeDefinition {
                id: "INIT-A".to_string(),
                display_name: "Initiative A".to_string(),
                declared_count: Some(1),
                members: vec![InitiativeMember {
                    policy_id: "POL-1".to_string(),
                    parameters: BTreeMap::new(),
                }],
                ..InitiativeDefinition::default()
            }),
        );
        StubSource { definitions }
    }

    fn raw(name: &str, target: &str) -> RawAssignment {
        RawAssignment {
            name: name.to_string(),
            target_id: target.to_string(),
            ..RawAssignment::default()
        }
    }

    fn initiative_target(id: &str) -> String {
        format!("/providers/Microsoft.Authorization/policySetDefinitions/{id}")
    }

    #[test]
    fn no_archetypes_is_fatal() {
        let source = stub_source();
        let err = run(&[], &source, &NoLinks).unwrap_err();
        assert!(matches!(err, PipelineError::NoArchetypes));
    }

    #[test]
    fn same_initiative_at_two_scopes_yields_two_listing_rows() {
        let archetypes = vec![
            Archetype {
                name: "S1".to_string(),
                assignments: vec![raw("Assign-A", &initiative_target("INIT-A"))],
            },
            Archetype {
                name: "S2".to_string(),
                assignments: vec![raw("Assign-A", &initiative_target("INIT-A"))],
            },
        ];
        let source = stub_source();
        let catalog = run(&archetypes, &source, &NoLinks).unwrap();

        assert_eq!(catalog.initiatives.len(), 2);
        assert_eq!(catalog.initiative_policies.len(), 2);
        let scopes: Vec<&str> = catalog.initiatives.iter().map(|i| i.scope.as_str()).collect();
        assert_eq!(scopes, vec!["S1", "S2"]);
    }

    #[test]
    fn redundant_raw_occurrences_collapse_within_a_scope() {
        let archetypes = vec![Archetype {
            name: "S1".to_string(),
            assignments: vec![
                raw("Assign-A", &initiative_target("INIT-A")),
                raw("Assign-A", &initiative_target("INIT-A")),
            ],
        }];
        let source = stub_source();
        let catalog = run(&archetypes, &source, &NoLinks).unwrap();
        assert_eq!(catalog.initiatives.len(), 1);
    }

    #[test]
    fn unclassifiable_assignment_is_skipped_and_reported() {
        let archetypes = vec![Archetype {
            name: "S1".to_string(),
            assignments: vec![raw("Assign-Broken", ""), raw("Assign-P", "POL-1")],
        }];
        let source = stub_source();
        let catalog = run(&archetypes, &source, &NoLinks).unwrap();

        assert_eq!(catalog.report.skipped.len(), 1);
        assert_eq!(catalog.report.skipped[0].assignment_name, "Assign-Broken");
        assert_eq!(catalog.report.assignments_seen, 2);
        assert_eq!(catalog.direct_policies.len(), 1);
        assert!(catalog.initiatives.is_empty());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let archetypes = vec![
            Archetype {
                name: "S2".to_string(),
                assignments: vec![
                    raw("Assign-A", &initiative_target("INIT-A")),
                    raw("Assign-P", "POL-1"),
                ],
            },
            Archetype {
                name: "S1".to_string(),
                assignments: vec![raw("Assign-A", &initiative_target("INIT-A"))],
            },
        ];
        let source = stub_source();
        let a = run(&archetypes, &source, &NoLinks).unwrap();
        let b = run(&archetypes, &source, &NoLinks).unwrap();

        let rows = |c: &super::Catalog| {
            c.initiatives
                .iter()
                .map(|i| (i.scope.clone(), i.initiative_id.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(rows(&a), rows(&b));
        assert_eq!(a.direct_policies.len(), b.direct_policies.len());
        assert_eq!(a.initiative_policies.len(), b.initiative_policies.len());
    }

    #[test]
    fn member_count_invariant_holds_for_every_initiative() {
        let archetypes = vec![Archetype {
            name: "S1".to_string(),
            assignments: vec![
                raw("Assign-A", &initiative_target("INIT-A")),
                raw("Assign-Gone", &initiative_target("INIT-GONE")),
            ],
        }];
        let source = stub_source();
        let catalog = run(&archetypes, &source, &NoLinks).unwrap();

        for init in &catalog.initiatives {
            assert_eq!(init.member_count, init.members.len());
        }
        assert_eq!(catalog.report.unresolved_rows, 1);
    }
}

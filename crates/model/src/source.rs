use crate::{Definition, Result, TargetKind};

/// Outcome of a definition lookup. Absence is a normal, expected result:
/// resolution degrades per row instead of aborting.
#[derive(Debug, Clone)]
pub enum Fetched {
    Found(Definition),
    NotFound,
}

impl Fetched {
    pub fn into_option(self) -> Option<Definition> {
        match self {
            Fetched::Found(def) => Some(def),
            Fetched::NotFound => None,
        }
    }
}

/// Lookup capability the expander needs. Implementations must be idempotent
/// per id within a run; the production implementation memoizes so each id is
/// fetched at most once. Tests substitute in-memory stubs.
pub trait DefinitionSource {
    fn fetch(&self, id: &str, kind: TargetKind) -> Result<Fetched>;
}

/// Reference-URL construction. Pure; a builder that has nothing to say
/// returns an empty string rather than failing.
pub trait LinkBuilder {
    /// Link to the definition's reference page
    fn definition_url(&self, id: &str, kind: TargetKind) -> String;

    /// Link to the assignment document declared at `scope`
    fn assignment_url(&self, scope: &str, assignment_name: &str) -> String;
}

/// Link builder that produces no links. Useful for tests and offline runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLinks;

impl LinkBuilder for NoLinks {
    fn definition_url(&self, _id: &str, _kind: TargetKind) -> String {
        String::new()
    }

    fn assignment_url(&self, _scope: &str, _assignment_name: &str) -> String {
        String::new()
    }
}

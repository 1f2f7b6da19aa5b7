use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope-aware identity: one definition assigned at one scope. Two items
/// sharing a `ScopedKey` are exact duplicates. Listings, breakdown dedup
/// and selection all key on this; it never collapses across scopes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopedKey {
    pub definition_id: String,
    pub scope: String,
}

impl ScopedKey {
    pub fn new(definition_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            definition_id: definition_id.into(),
            scope: scope.into(),
        }
    }
}

impl fmt::Display for ScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.definition_id, self.scope)
    }
}

/// Scope-collapsing identity: the definition alone. Used where the same
/// definition must be treated as one regardless of how many scopes assign
/// it, e.g. the fetch cache. Deliberately a distinct type from
/// [`ScopedKey`] so the two cannot be confused at call sites.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DefinitionKey(pub String);

impl DefinitionKey {
    pub fn new(definition_id: impl Into<String>) -> Self {
        Self(definition_id.into())
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use crate::ScopedKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Analyst selection driving the breakdown view. Keys are scope-aware:
/// including "Initiative X at scope A" says nothing about scope B.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    /// Included initiative instances
    pub initiatives: BTreeSet<ScopedKey>,

    /// Included direct policy instances (rows with no parent initiative)
    pub direct_policies: BTreeSet<ScopedKey>,
}

impl SelectionSet {
    pub fn is_empty(&self) -> bool {
        self.initiatives.is_empty() && self.direct_policies.is_empty()
    }

    pub fn include_initiative(&mut self, key: ScopedKey) {
        self.initiatives.insert(key);
    }

    pub fn include_direct_policy(&mut self, key: ScopedKey) {
        self.direct_policies.insert(key);
    }
}

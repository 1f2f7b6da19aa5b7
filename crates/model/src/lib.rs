//! # Catalog Model
//!
//! Domain types shared by every stage of the policy catalog pipeline.
//!
//! ## Entities
//!
//! ```text
//! Archetype (scope)
//!     │
//!     ├──> RawAssignment ──classify──> Assignment (Policy | Initiative)
//!     │
//!     ├──> Definition (fetched by id via DefinitionSource)
//!     │      ├─ PolicyDefinition     (effect, parameter defaults)
//!     │      └─ InitiativeDefinition (ordered members + parameter bindings)
//!     │
//!     └──> Resolved entities
//!            ├─ ResolvedPolicy     (one policy at one scope, merged params)
//!            └─ ResolvedInitiative (one initiative at one scope + members)
//! ```
//!
//! Identity is modeled as two distinct key types rather than one key with a
//! flag: [`ScopedKey`] for scope-aware contexts (listings, breakdown dedup,
//! selection) and [`DefinitionKey`] for scope-collapsing contexts (the
//! definition fetch cache).

mod assignment;
mod definition;
mod error;
mod identity;
mod resolved;
mod selection;
mod source;

pub use assignment::{Archetype, Assignment, EnforcementMode, RawAssignment, TargetKind};
pub use definition::{
    extract_definition_id, Definition, InitiativeDefinition, InitiativeMember, MemberParam,
    PolicyDefinition,
};
pub use error::{Result, SourceError};
pub use identity::{DefinitionKey, ScopedKey};
pub use resolved::{ParentInitiative, ResolvedInitiative, ResolvedPolicy};
pub use selection::SelectionSet;
pub use source::{DefinitionSource, Fetched, LinkBuilder, NoLinks};

//! # Catalog Resolver
//!
//! The resolution/deduplication engine: turns raw archetype assignments into
//! a deduplicated, cross-referenced catalog.
//!
//! ## Pipeline
//!
//! ```text
//! Archetype[]
//!     │
//!     ├──> Classifier (policy vs initiative, per assignment)
//!     │      └─> Assignment (unclassifiable rows skipped + counted)
//!     │
//!     ├──> Expander (one-level initiative expansion, parameter merge)
//!     │      ├─> ResolvedInitiative (+ ordered members)
//!     │      └─> ResolvedPolicy     (direct assignments)
//!     │
//!     ├──> Identity Resolver (scope-aware dedup, richer row wins)
//!     │
//!     └──> Breakdown Composer (selection-driven union, pure)
//! ```
//!
//! The expander fetches definitions through the [`catalog_model::DefinitionSource`]
//! capability and degrades every failure to a flagged row; nothing here is
//! fatal except discovering zero archetypes.

mod breakdown;
mod classify;
mod error;
mod expand;
mod identity;
mod pipeline;
mod report;

pub use breakdown::compose_breakdown;
pub use classify::classify;
pub use error::{ClassifyError, PipelineError, Result};
pub use expand::Expander;
pub use identity::{dedupe_initiatives, dedupe_member_policies, dedupe_policies};
pub use pipeline::{run, Catalog};
pub use report::{RunReport, SkippedAssignment};

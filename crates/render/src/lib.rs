//! # Catalog Render
//!
//! Persists the resolved catalog as four CSV tables and re-derives the
//! breakdown view from edited include flags without touching the network.
//!
//! ## Tables
//!
//! ```text
//! <output dir>/
//!     initiatives.csv          one row per (initiative, scope), include flag
//!     direct_policies.csv      one row per direct (policy, scope), include flag
//!     initiative_policies.csv  one row per expansion path (initiative, policy, scope)
//!     breakdown.csv            selection-driven union, recomputable offline
//! ```
//!
//! An analyst flips `include` cells to `Yes` in the first two tables and
//! reruns the breakdown; selection changes are read, never fetched.

mod error;
mod sink;
mod tables;

pub use error::{RenderError, Result};
pub use sink::{read_selection, recompute_breakdown, write_catalog};
pub use tables::{BREAKDOWN_FILE, DIRECT_POLICIES_FILE, INITIATIVES_FILE, INITIATIVE_POLICIES_FILE};

//! # Catalog Fetch
//!
//! Remote-document collaborators for the policy catalog pipeline. The core
//! resolver never talks to the network; everything it needs arrives through
//! the structures and traits this crate populates.
//!
//! ## Sources
//!
//! ```text
//! GitHub (contents API + raw files)
//!     ├──> archetype definitions  -> Archetype[] (scope + assignment names)
//!     └──> assignment documents   -> RawAssignment per referencing scope
//!
//! AzAdvertizer (definition pages)
//!     └──> policy / initiative definitions, extracted from the page's
//!          embedded copyDef() JSON, memoized at most once per id
//! ```
//!
//! Requests are paced per host by an explicit [`Pacer`] carried in
//! [`FetchConfig`]; there is no ambient global state, so the resolver stays
//! independently testable with stub sources.

mod advertizer;
mod config;
mod error;
mod github;
mod links;
mod pacing;

pub use advertizer::AdvertizerSource;
pub use config::FetchConfig;
pub use error::{FetchError, Result};
pub use github::GithubFetcher;
pub use links::CatalogLinks;
pub use pacing::Pacer;

//! featpack Library
//!
//! Resolves feature-toggle build profiles against a component catalog into
//! per-component build plans (`EXCLUDED`, `STUB` or `FULL`) for an external
//! build orchestrator.

pub mod catalog;
pub mod cli;
pub mod error;
pub mod logic;
pub mod plan;
pub mod profile;
pub mod types;

// Re-export main types for convenience
pub use catalog::{
    CatalogBuilder, CatalogError, CatalogFile, ComponentBuilder, ComponentCatalog, ComponentGroup,
    ComponentSpec, GlobalOption,
};
pub use error::FeatpackError;
pub use logic::resolve_str;
pub use logic::resolver::{resolve, ValidationError, ValidationReport};
pub use plan::ResolvedBuildPlan;
pub use profile::{ProfileEntry, ProfileParseError, RawProfile};
pub use types::{BuildState, FlagKind, FlagValue, FlagValueError};

//! Logic modules: turn a profile into a build plan.
//!
//! # Modules
//!
//! - `resolver`: flag validation and per-component state derivation

pub mod resolver;

use crate::catalog::ComponentCatalog;
use crate::error::Result;
use crate::plan::ResolvedBuildPlan;
use crate::profile::RawProfile;

/// Parse profile text and resolve it in one step.
pub fn resolve_str(text: &str, catalog: &ComponentCatalog) -> Result<ResolvedBuildPlan> {
    let profile: RawProfile = text.parse()?;
    Ok(resolver::resolve(&profile, catalog)?)
}

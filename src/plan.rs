//! Resolved build plan handed to the build orchestrator.
//!
//! # Defines
//!
//! Besides the per-component states, the plan carries the preprocessor
//! defines the orchestrator passes to the compiler:
//!
//! | Condition                          | Define                 |
//! |------------------------------------|------------------------|
//! | component EXCLUDED                 | `<STEM>_DISABLED`      |
//! | component STUB                     | `EMPTY_<STEM>`         |
//! | every member of a group EXCLUDED   | the group's define     |
//! | global option set to 1             | the option's define    |

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::ComponentCatalog;
use crate::types::BuildState;

/// Per-component decision for one resolution.
///
/// Only the resolver creates plans; there are no mutating methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedBuildPlan {
    components: BTreeMap<String, BuildState>,
    options: BTreeMap<String, bool>,
    defines: BTreeSet<String>,
}

impl ResolvedBuildPlan {
    /// Assemble a plan from validated states and derive its defines.
    ///
    /// `components` must hold every catalog component.
    pub(crate) fn new(
        catalog: &ComponentCatalog,
        components: BTreeMap<String, BuildState>,
        options: BTreeMap<String, bool>,
    ) -> Self {
        let mut defines = BTreeSet::new();

        for spec in catalog.components() {
            match components.get(&spec.name).copied().unwrap_or_default() {
                BuildState::Excluded => {
                    defines.insert(format!("{}_DISABLED", spec.define_stem()));
                }
                BuildState::Stub => {
                    defines.insert(format!("EMPTY_{}", spec.define_stem()));
                }
                BuildState::Full => {}
            }
        }

        for group in catalog.groups() {
            let all_excluded = group
                .members
                .iter()
                .all(|m| components.get(m).copied().unwrap_or_default() == BuildState::Excluded);
            if all_excluded {
                defines.insert(group.define.clone());
            }
        }

        for option in catalog.options() {
            if options.get(&option.name).copied().unwrap_or(false) {
                defines.insert(option.define.clone());
            }
        }

        Self {
            components,
            options,
            defines,
        }
    }

    /// State of a component; `None` if it is not in the catalog
    pub fn state(&self, component: &str) -> Option<BuildState> {
        self.components.get(component).copied()
    }

    /// Check if a component's symbols exist in the build (full or stub)
    pub fn has(&self, component: &str) -> bool {
        self.state(component).is_some_and(|s| s.is_present())
    }

    /// Iterate over `(component, state)` in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, BuildState)> {
        self.components.iter().map(|(name, state)| (name.as_str(), *state))
    }

    /// Components resolved to `state`, in name order
    pub fn components_in(&self, state: BuildState) -> Vec<&str> {
        self.iter()
            .filter(|(_, s)| *s == state)
            .map(|(name, _)| name)
            .collect()
    }

    /// Number of components resolved to `state`
    pub fn count(&self, state: BuildState) -> usize {
        self.components.values().filter(|s| **s == state).count()
    }

    /// Value of a global option; `None` if the catalog does not declare it
    pub fn option(&self, name: &str) -> Option<bool> {
        self.options.get(name).copied()
    }

    /// Preprocessor defines, sorted
    pub fn defines(&self) -> impl Iterator<Item = &str> {
        self.defines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Pretty JSON for the orchestrator
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One `name STATE` line per component, names padded to a column
impl fmt::Display for ResolvedBuildPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .components
            .keys()
            .chain(self.options.keys())
            .map(String::len)
            .max()
            .unwrap_or(0);
        for (name, state) in self.iter() {
            writeln!(f, "{:<width$}  {}", name, state, width = width)?;
        }
        for (name, value) in &self.options {
            writeln!(f, "{:<width$}  {}", name, u8::from(*value), width = width)?;
        }
        Ok(())
    }
}

//! Profile Resolver
//!
//! Validates a [`RawProfile`] against a [`ComponentCatalog`] and derives a
//! [`BuildState`] for every component.
//!
//! # Design
//!
//! - **Pure logic**: no I/O, no logging, no mutation of the catalog
//! - **Exhaustive**: every violation is collected and reported in one pass
//! - **Total**: every catalog component ends up in the plan, absent flags
//!   default to 0
//!
//! # Resolution Rules
//!
//! | `_enabled` | `_empty` | Result |
//! |------------|----------|--------|
//! | 0 / absent | 0 / absent | `EXCLUDED` |
//! | 1          | 0 / absent | `FULL` |
//! | 1          | 1          | `STUB` (needs an empty variant) |
//! | 0 / absent | 1          | `ContradictoryFlags` |
//!
//! Dependency checks run in a second pass, after every component has been
//! validated on its own.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use strum::IntoEnumIterator;
use thiserror::Error;

use crate::catalog::ComponentCatalog;
use crate::plan::ResolvedBuildPlan;
use crate::profile::RawProfile;
use crate::types::{BuildState, FlagKind, FlagValue};

/// A single profile violation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Key is neither `<component>_enabled`, `<component>_empty` nor a global option
    #[error("malformed flag name '{key}' (expected '<component>_enabled' or '<component>_empty')")]
    MalformedFlagName { key: String },

    /// Key refers to a component the catalog does not know
    #[error("unknown component '{component}' in flag '{key}'")]
    UnknownComponent { component: String, key: String },

    /// Value is not exactly 0 or 1
    #[error("invalid value '{value}' for flag '{key}' (expected 0 or 1)")]
    InvalidFlagValue { key: String, value: String },

    /// `_empty = 1` while the component is not enabled
    #[error("component '{component}' is marked empty but is not enabled")]
    ContradictoryFlags { component: String },

    /// `_empty = 1` on a component without a stub
    #[error("component '{component}' does not support an empty variant")]
    UnsupportedEmptyVariant { component: String },

    /// Enabled component whose dependency is excluded
    #[error("component '{component}' requires '{dependency}', which is excluded")]
    UnsatisfiedDependency {
        component: String,
        dependency: String,
    },
}

impl ValidationError {
    /// The profile key the violation was found on, for line-level diagnostics
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MalformedFlagName { key }
            | Self::UnknownComponent { key, .. }
            | Self::InvalidFlagValue { key, .. } => Some(key.as_str()),
            Self::ContradictoryFlags { .. }
            | Self::UnsupportedEmptyVariant { .. }
            | Self::UnsatisfiedDependency { .. } => None,
        }
    }

    /// The component the violation concerns, if one could be identified
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::MalformedFlagName { .. } => None,
            Self::UnknownComponent { component, .. }
            | Self::ContradictoryFlags { component }
            | Self::UnsupportedEmptyVariant { component }
            | Self::UnsatisfiedDependency { component, .. } => Some(component.as_str()),
            Self::InvalidFlagValue { key, .. } => split_flag_key(key).map(|(c, _)| c),
        }
    }
}

/// Every violation found in one resolution, in report order.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    fn new(errors: Vec<ValidationError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self { errors }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if any violation matches `predicate`
    pub fn contains(&self, predicate: impl Fn(&ValidationError) -> bool) -> bool {
        self.errors.iter().any(predicate)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} profile violation(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

impl IntoIterator for ValidationReport {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Flags seen for one component
#[derive(Debug, Clone, Copy, Default)]
struct ComponentFlags {
    enabled: bool,
    empty: bool,
}

impl ComponentFlags {
    fn set(&mut self, kind: FlagKind, value: bool) {
        match kind {
            FlagKind::Enabled => self.enabled = value,
            FlagKind::Empty => self.empty = value,
        }
    }
}

/// Resolve a profile into a build plan.
///
/// # Returns
///
/// The plan, or a report listing every violation. Reported in this order:
/// 1. Per-key problems (malformed name, unknown component, bad value), by key
/// 2. Per-component flag contradictions, by component name
/// 3. Unsatisfied dependencies, by component then dependency name
///
/// A component with a bad value on one of its own flags is left out of steps
/// 2 and 3, as is any dependency check that would need its state.
pub fn resolve(
    profile: &RawProfile,
    catalog: &ComponentCatalog,
) -> Result<ResolvedBuildPlan, ValidationReport> {
    let mut errors = Vec::new();

    // 1. Keys and values
    let mut flags: BTreeMap<&str, ComponentFlags> = BTreeMap::new();
    let mut unresolved: BTreeSet<&str> = BTreeSet::new();
    let mut options: BTreeMap<String, bool> = catalog
        .options()
        .map(|option| (option.name.clone(), false))
        .collect();

    for (key, value) in profile.iter() {
        if catalog.option(key).is_some() {
            match value.parse::<FlagValue>() {
                Ok(flag) => {
                    options.insert(key.to_string(), flag.as_bool());
                }
                Err(_) => errors.push(invalid_value(key, value)),
            }
            continue;
        }

        let Some((component, kind)) = split_flag_key(key) else {
            errors.push(ValidationError::MalformedFlagName {
                key: key.to_string(),
            });
            continue;
        };

        let Ok(spec) = catalog.lookup(component) else {
            errors.push(ValidationError::UnknownComponent {
                component: component.to_string(),
                key: key.to_string(),
            });
            continue;
        };

        match value.parse::<FlagValue>() {
            Ok(flag) => flags
                .entry(spec.name.as_str())
                .or_default()
                .set(kind, flag.as_bool()),
            Err(_) => {
                errors.push(invalid_value(key, value));
                unresolved.insert(spec.name.as_str());
            }
        }
    }

    // 2. Per-component state, for the whole catalog
    let mut states: BTreeMap<String, BuildState> = BTreeMap::new();
    for spec in catalog.components() {
        if unresolved.contains(spec.name.as_str()) {
            continue;
        }
        let ComponentFlags { enabled, empty } =
            flags.get(spec.name.as_str()).copied().unwrap_or_default();

        if empty && !enabled {
            errors.push(ValidationError::ContradictoryFlags {
                component: spec.name.clone(),
            });
            continue;
        }
        if empty && !spec.has_empty_variant {
            errors.push(ValidationError::UnsupportedEmptyVariant {
                component: spec.name.clone(),
            });
            continue;
        }
        states.insert(spec.name.clone(), BuildState::from_flags(enabled, empty));
    }

    // 3. Dependencies, only between components that resolved cleanly
    for spec in catalog.components() {
        let present = states.get(&spec.name).is_some_and(|s| s.is_present());
        if !present {
            continue;
        }
        for dependency in &spec.depends_on {
            if states.get(dependency) == Some(&BuildState::Excluded) {
                errors.push(ValidationError::UnsatisfiedDependency {
                    component: spec.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    if !errors.is_empty() {
        return Err(ValidationReport::new(errors));
    }

    Ok(ResolvedBuildPlan::new(catalog, states, options))
}

/// Split `<component>_enabled` / `<component>_empty` into its parts.
fn split_flag_key(key: &str) -> Option<(&str, FlagKind)> {
    FlagKind::iter().find_map(|kind| {
        key.strip_suffix(kind.suffix())
            .filter(|component| !component.is_empty())
            .map(|component| (component, kind))
    })
}

fn invalid_value(key: &str, value: &str) -> ValidationError {
    ValidationError::InvalidFlagValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ComponentSpec, GlobalOption};

    /// Helper: both debug helpers have stubs, `database` needs `tabular_box`
    fn test_catalog() -> ComponentCatalog {
        ComponentCatalog::builder()
            .component(ComponentSpec::builder("line3d", "").with_empty_variant().build())
            .component(ComponentSpec::builder("overlayinfo", "").with_empty_variant().build())
            .component(ComponentSpec::builder("quantize", "").build())
            .component(ComponentSpec::builder("tabular_box", "").build())
            .component(ComponentSpec::builder("database", "").depends_on("tabular_box").build())
            .option(GlobalOption::new("force_no_editor", "EDITOR_DISABLED", ""))
            .build()
            .unwrap()
    }

    fn profile(pairs: &[(&str, &str)]) -> RawProfile {
        pairs.iter().copied().collect()
    }

    fn resolve_err(pairs: &[(&str, &str)]) -> Vec<ValidationError> {
        resolve(&profile(pairs), &test_catalog())
            .expect_err("profile should be rejected")
            .into_iter()
            .collect()
    }

    #[test]
    fn test_split_flag_key() {
        assert_eq!(split_flag_key("line3d_enabled"), Some(("line3d", FlagKind::Enabled)));
        assert_eq!(split_flag_key("tabular_box_empty"), Some(("tabular_box", FlagKind::Empty)));
        assert_eq!(split_flag_key("_enabled"), None);
        assert_eq!(split_flag_key("line3d"), None);
        assert_eq!(split_flag_key("line3d_enable"), None);
    }

    #[test]
    fn test_empty_profile_excludes_everything() {
        let plan = resolve(&RawProfile::new(), &test_catalog()).unwrap();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.count(BuildState::Excluded), 5);
        assert_eq!(plan.option("force_no_editor"), Some(false));
    }

    #[test]
    fn test_full_and_stub_states() {
        let plan = resolve(
            &profile(&[
                ("line3d_enabled", "1"),
                ("line3d_empty", "0"),
                ("overlayinfo_enabled", "1"),
                ("overlayinfo_empty", "1"),
            ]),
            &test_catalog(),
        )
        .unwrap();

        assert_eq!(plan.state("line3d"), Some(BuildState::Full));
        assert_eq!(plan.state("overlayinfo"), Some(BuildState::Stub));
        assert_eq!(plan.state("quantize"), Some(BuildState::Excluded));
        assert_eq!(plan.state("database"), Some(BuildState::Excluded));
    }

    #[test]
    fn test_disabled_with_empty_zero_is_excluded() {
        let plan = resolve(
            &profile(&[("line3d_enabled", "0"), ("line3d_empty", "0")]),
            &test_catalog(),
        )
        .unwrap();
        assert_eq!(plan.state("line3d"), Some(BuildState::Excluded));
    }

    #[test]
    fn test_contradictory_flags() {
        assert_eq!(
            resolve_err(&[("line3d_enabled", "0"), ("line3d_empty", "1")]),
            vec![ValidationError::ContradictoryFlags {
                component: "line3d".to_string()
            }]
        );
        // Absent `_enabled` is the same as 0
        assert_eq!(
            resolve_err(&[("overlayinfo_empty", "1")]),
            vec![ValidationError::ContradictoryFlags {
                component: "overlayinfo".to_string()
            }]
        );
    }

    #[test]
    fn test_contradiction_wins_over_missing_empty_variant() {
        assert_eq!(
            resolve_err(&[("quantize_empty", "1")]),
            vec![ValidationError::ContradictoryFlags {
                component: "quantize".to_string()
            }]
        );
    }

    #[test]
    fn test_unsupported_empty_variant() {
        assert_eq!(
            resolve_err(&[("quantize_enabled", "1"), ("quantize_empty", "1")]),
            vec![ValidationError::UnsupportedEmptyVariant {
                component: "quantize".to_string()
            }]
        );
    }

    #[test]
    fn test_malformed_and_unknown_keys() {
        assert_eq!(
            resolve_err(&[("line3d", "1"), ("gizmo_enabled", "1")]),
            vec![
                ValidationError::UnknownComponent {
                    component: "gizmo".to_string(),
                    key: "gizmo_enabled".to_string(),
                },
                ValidationError::MalformedFlagName {
                    key: "line3d".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_invalid_values() {
        let errors = resolve_err(&[("line3d_enabled", "2"), ("quantize_enabled", "yes")]);
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidFlagValue {
                    key: "line3d_enabled".to_string(),
                    value: "2".to_string(),
                },
                ValidationError::InvalidFlagValue {
                    key: "quantize_enabled".to_string(),
                    value: "yes".to_string(),
                },
            ]
        );
        assert_eq!(errors[0].component(), Some("line3d"));
        assert_eq!(errors[1].key(), Some("quantize_enabled"));
    }

    #[test]
    fn test_invalid_option_value() {
        assert_eq!(
            resolve_err(&[("force_no_editor", "on")]),
            vec![ValidationError::InvalidFlagValue {
                key: "force_no_editor".to_string(),
                value: "on".to_string(),
            }]
        );
    }

    #[test]
    fn test_option_value_recorded() {
        let plan = resolve(&profile(&[("force_no_editor", "1")]), &test_catalog()).unwrap();
        assert_eq!(plan.option("force_no_editor"), Some(true));
        assert!(plan.defines().any(|d| d == "EDITOR_DISABLED"));
    }

    #[test]
    fn test_unsatisfied_dependency() {
        assert_eq!(
            resolve_err(&[("database_enabled", "1")]),
            vec![ValidationError::UnsatisfiedDependency {
                component: "database".to_string(),
                dependency: "tabular_box".to_string(),
            }]
        );
    }

    #[test]
    fn test_dependency_satisfied() {
        let plan = resolve(
            &profile(&[("database_enabled", "1"), ("tabular_box_enabled", "1")]),
            &test_catalog(),
        )
        .unwrap();
        assert_eq!(plan.state("database"), Some(BuildState::Full));
        assert_eq!(plan.state("tabular_box"), Some(BuildState::Full));
    }

    #[test]
    fn test_excluded_component_ignores_its_dependencies() {
        let plan = resolve(&profile(&[("tabular_box_enabled", "0")]), &test_catalog()).unwrap();
        assert_eq!(plan.state("database"), Some(BuildState::Excluded));
    }

    #[test]
    fn test_bad_dependency_value_is_not_masked() {
        // tabular_box's own error is reported instead of a dependency error
        assert_eq!(
            resolve_err(&[("database_enabled", "1"), ("tabular_box_enabled", "maybe")]),
            vec![ValidationError::InvalidFlagValue {
                key: "tabular_box_enabled".to_string(),
                value: "maybe".to_string(),
            }]
        );
    }

    #[test]
    fn test_all_violations_reported() {
        let errors = resolve_err(&[
            ("bogus", "1"),
            ("database_enabled", "1"),
            ("line3d_empty", "1"),
            ("quantize_enabled", "1"),
            ("quantize_empty", "1"),
            ("overlayinfo_enabled", "3"),
        ]);

        assert_eq!(
            errors,
            vec![
                ValidationError::MalformedFlagName {
                    key: "bogus".to_string()
                },
                ValidationError::InvalidFlagValue {
                    key: "overlayinfo_enabled".to_string(),
                    value: "3".to_string(),
                },
                ValidationError::ContradictoryFlags {
                    component: "line3d".to_string()
                },
                ValidationError::UnsupportedEmptyVariant {
                    component: "quantize".to_string()
                },
                ValidationError::UnsatisfiedDependency {
                    component: "database".to_string(),
                    dependency: "tabular_box".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_report_display() {
        let report = resolve(&profile(&[("x", "1"), ("line3d_empty", "1")]), &test_catalog())
            .unwrap_err();
        assert_eq!(
            report.to_string(),
            "2 profile violation(s)\n  \
             - malformed flag name 'x' (expected '<component>_enabled' or '<component>_empty')\n  \
             - component 'line3d' is marked empty but is not enabled"
        );
        assert!(report.contains(|e| matches!(e, ValidationError::ContradictoryFlags { .. })));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let catalog = test_catalog();
        let profile = profile(&[("line3d_enabled", "1"), ("overlayinfo_enabled", "1")]);
        assert_eq!(resolve(&profile, &catalog), resolve(&profile, &catalog));
    }
}

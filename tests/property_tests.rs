//! Property-Based Tests for featpack
//!
//! These tests verify resolution invariants over generated profiles:
//! - Totality and idempotence of successful resolutions
//! - The flag-pair to build-state table
//! - Rejection of contradictions and non-binary values

use proptest::prelude::*;

use featpack::{
    resolve, BuildState, ComponentCatalog, ComponentSpec, RawProfile, ValidationError,
};

// =============================================================================
// Strategies
// =============================================================================

/// Catalog with a mix of stub-capable and plain components, no dependencies
fn flat_catalog() -> ComponentCatalog {
    ComponentCatalog::builder()
        .component(ComponentSpec::builder("alpha", "").with_empty_variant().build())
        .component(ComponentSpec::builder("beta", "").with_empty_variant().build())
        .component(ComponentSpec::builder("gamma", "").build())
        .component(ComponentSpec::builder("delta", "").build())
        .build()
        .expect("Test catalog should be valid")
}

/// Flag value for one key: absent, 0 or 1
fn flag_strategy() -> impl Strategy<Value = Option<bool>> {
    prop_oneof![Just(None), Just(Some(false)), Just(Some(true))]
}

/// `(enabled, empty)` for each of the four test components
fn flags_strategy() -> impl Strategy<Value = Vec<(Option<bool>, Option<bool>)>> {
    prop::collection::vec((flag_strategy(), flag_strategy()), 4)
}

/// Build a profile from generated flags, leaving absent flags out
fn build_profile(flags: &[(Option<bool>, Option<bool>)]) -> RawProfile {
    let names = ["alpha", "beta", "gamma", "delta"];
    let mut profile = RawProfile::new();
    for (name, (enabled, empty)) in names.iter().zip(flags) {
        if let Some(v) = enabled {
            profile.insert(format!("{name}_enabled"), u8::from(*v));
        }
        if let Some(v) = empty {
            profile.insert(format!("{name}_empty"), u8::from(*v));
        }
    }
    profile
}

/// Values that must never be accepted as a flag
fn invalid_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (2i64..1000).prop_map(|n| n.to_string()),
        (-1000i64..0).prop_map(|n| n.to_string()),
        "[a-z]{1,6}",
        Just("1.0".to_string()),
        Just(String::new()),
    ]
}

// =============================================================================
// Resolution Properties
// =============================================================================

proptest! {
    /// Every outcome follows the flag table, and successful plans are total
    #[test]
    fn resolution_follows_flag_table(flags in flags_strategy()) {
        let catalog = flat_catalog();
        let profile = build_profile(&flags);
        let names = ["alpha", "beta", "gamma", "delta"];

        match resolve(&profile, &catalog) {
            Ok(plan) => {
                prop_assert_eq!(plan.len(), catalog.len());
                for (name, (enabled, empty)) in names.iter().zip(&flags) {
                    let expected = match (enabled.unwrap_or(false), empty.unwrap_or(false)) {
                        (false, _) => BuildState::Excluded,
                        (true, true) => BuildState::Stub,
                        (true, false) => BuildState::Full,
                    };
                    prop_assert_eq!(plan.state(name), Some(expected));
                }
            }
            Err(report) => {
                for error in report.errors() {
                    let component = error.component().expect("Flag errors name a component");
                    let index = names.iter().position(|n| *n == component).unwrap();
                    let (enabled, empty) = flags[index];
                    let stub_capable = catalog.lookup(component).unwrap().has_empty_variant;

                    prop_assert_eq!(empty, Some(true));
                    match error {
                        ValidationError::ContradictoryFlags { .. } => {
                            prop_assert_ne!(enabled, Some(true));
                        }
                        ValidationError::UnsupportedEmptyVariant { .. } => {
                            prop_assert_eq!(enabled, Some(true));
                            prop_assert!(!stub_capable);
                        }
                        other => prop_assert!(false, "unexpected violation: {}", other),
                    }
                }
            }
        }
    }

    /// Resolving twice gives identical results
    #[test]
    fn resolution_is_idempotent(flags in flags_strategy()) {
        let catalog = flat_catalog();
        let profile = build_profile(&flags);
        prop_assert_eq!(resolve(&profile, &catalog), resolve(&profile, &catalog));
    }

    /// `empty=1` without `enabled=1` is rejected whatever the catalog says
    #[test]
    fn empty_without_enabled_is_contradictory(
        stub_capable in any::<bool>(),
        enabled_present in any::<bool>(),
    ) {
        let mut builder = ComponentSpec::builder("widget", "");
        if stub_capable {
            builder = builder.with_empty_variant();
        }
        let catalog = ComponentCatalog::builder().component(builder.build()).build().unwrap();

        let mut profile = RawProfile::new().with("widget_empty", 1);
        if enabled_present {
            profile.insert("widget_enabled", 0);
        }

        let report = resolve(&profile, &catalog).unwrap_err();
        prop_assert_eq!(
            report.errors(),
            &[ValidationError::ContradictoryFlags { component: "widget".to_string() }]
        );
    }

    /// Any value other than 0/1 is an InvalidFlagValue on that key
    #[test]
    fn non_binary_values_are_rejected(value in invalid_value_strategy(), use_empty in any::<bool>()) {
        let key = if use_empty { "alpha_empty" } else { "alpha_enabled" };
        let profile = RawProfile::new().with(key, &value);

        let report = resolve(&profile, &flat_catalog()).unwrap_err();
        prop_assert_eq!(
            report.errors(),
            &[ValidationError::InvalidFlagValue { key: key.to_string(), value: value.clone() }]
        );
    }

    /// Keys without a flag suffix are malformed, never silently ignored
    #[test]
    fn keys_without_suffix_are_malformed(key in "[a-z][a-z0-9]{0,10}") {
        let profile = RawProfile::new().with(key.as_str(), 1);
        let report = resolve(&profile, &flat_catalog()).unwrap_err();
        prop_assert_eq!(
            report.errors(),
            &[ValidationError::MalformedFlagName { key: key.clone() }]
        );
    }
}

// =============================================================================
// Profile Text Properties
// =============================================================================

proptest! {
    /// Rendering a profile and parsing it back preserves every entry
    #[test]
    fn profile_text_preserves_entries(
        entries in prop::collection::btree_map("[a-z][a-z0-9_]{0,12}", "[0-9a-z]{1,4}", 0..12)
    ) {
        let profile: RawProfile = entries.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let parsed: RawProfile = profile.to_string().parse().unwrap();

        prop_assert_eq!(parsed.len(), entries.len());
        for (key, value) in &entries {
            prop_assert_eq!(parsed.get(key), Some(value.as_str()));
        }
    }
}

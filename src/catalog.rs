//! Component Catalog
//!
//! The static schema side of a build profile: which optional components
//! exist, which of them can be compiled as inert stubs, and which ones need
//! another component to be present.
//!
//! # Design Principles
//!
//! 1. **Schema is data**: component names never appear in resolver logic
//! 2. **Validated once**: a catalog is checked when it is built and is
//!    read-only afterwards, so it can be shared freely between resolutions
//! 3. **Deterministic**: all collections are ordered by name
//!
//! # Catalog File Format
//!
//! Catalogs can also be loaded from JSON:
//! ```json
//! {
//!   "components": [
//!     { "name": "tabular_box", "description": "Tabular editing control" },
//!     { "name": "database", "depends_on": ["tabular_box"] },
//!     { "name": "overlayinfo", "has_empty_variant": true, "define": "OVERLAY_INFO" }
//!   ],
//!   "groups": [
//!     { "name": "ui", "define": "ALL_UI_DISABLED", "members": ["tabular_box"] }
//!   ],
//!   "options": [
//!     { "name": "force_no_editor", "define": "EDITOR_DISABLED" }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::FlagKind;

/// Errors raised while looking up or assembling a catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Name is not registered
    #[error("Unknown component: {name}")]
    UnknownComponent { name: String },

    /// Same component registered twice
    #[error("Component '{name}' is registered more than once")]
    DuplicateComponent { name: String },

    /// Same group registered twice
    #[error("Group '{name}' is registered more than once")]
    DuplicateGroup { name: String },

    /// Same global option registered twice
    #[error("Option '{name}' is registered more than once")]
    DuplicateOption { name: String },

    /// Component, group or option name outside `[a-z][a-z0-9_]*`
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Define token outside `[A-Z][A-Z0-9_]*`
    #[error("Invalid define '{define}' for '{owner}'")]
    InvalidDefine { owner: String, define: String },

    /// `depends_on` names something that is not in the catalog
    #[error("Component '{component}' depends on unknown component '{dependency}'")]
    UnknownDependency { component: String, dependency: String },

    /// A component listing itself in `depends_on`
    #[error("Component '{component}' depends on itself")]
    SelfDependency { component: String },

    /// A group listing an unregistered member
    #[error("Group '{group}' lists unknown component '{member}'")]
    UnknownGroupMember { group: String, member: String },

    /// A group without members would always be "all excluded"
    #[error("Group '{group}' has no members")]
    EmptyGroup { group: String },

    /// A global option whose name is also a component flag key
    #[error("Option '{option}' collides with the flag of component '{component}'")]
    OptionConflict { option: String, component: String },
}

/// Definition of one optional component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentSpec {
    /// Unique identifier, also the prefix of its profile keys
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Whether a compiled-in but inert stub exists
    #[serde(default)]
    pub has_empty_variant: bool,

    /// Components that must be at least stubbed when this one is enabled
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,

    /// Stem for emitted defines; the uppercased name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub define: Option<String>,
}

impl ComponentSpec {
    /// Start building a component definition
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder::new(name, description)
    }

    /// Define stem used by the build (`OVERLAY_INFO` for `overlayinfo`)
    pub fn define_stem(&self) -> String {
        self.define
            .clone()
            .unwrap_or_else(|| self.name.to_ascii_uppercase())
    }

    /// Profile key of one of this component's flags
    pub fn flag_key(&self, kind: FlagKind) -> String {
        kind.key_for(&self.name)
    }
}

/// Builder for creating ComponentSpec instances
#[derive(Debug, Clone)]
pub struct ComponentBuilder {
    spec: ComponentSpec,
}

impl ComponentBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            spec: ComponentSpec {
                name: name.into(),
                description: description.into(),
                has_empty_variant: false,
                depends_on: BTreeSet::new(),
                define: None,
            },
        }
    }

    /// Allow the stub state
    pub fn with_empty_variant(mut self) -> Self {
        self.spec.has_empty_variant = true;
        self
    }

    /// Require another component to be present when this one is enabled
    pub fn depends_on(mut self, component: impl Into<String>) -> Self {
        self.spec.depends_on.insert(component.into());
        self
    }

    /// Override the define stem
    pub fn define(mut self, stem: impl Into<String>) -> Self {
        self.spec.define = Some(stem.into());
        self
    }

    pub fn build(self) -> ComponentSpec {
        self.spec
    }
}

/// Components sharing one define that is emitted when all of them are excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentGroup {
    pub name: String,

    /// Full define token, e.g. `ALL_UI_DISABLED`
    pub define: String,

    pub members: BTreeSet<String>,

    #[serde(default)]
    pub description: String,
}

impl ComponentGroup {
    pub fn new<I, S>(name: impl Into<String>, define: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            define: define.into(),
            members: members.into_iter().map(Into::into).collect(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A profile switch that is not tied to a single component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalOption {
    /// Profile key, used verbatim
    pub name: String,

    /// Define emitted when the option is set to 1
    pub define: String,

    #[serde(default)]
    pub description: String,
}

impl GlobalOption {
    pub fn new(
        name: impl Into<String>,
        define: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            define: define.into(),
            description: description.into(),
        }
    }
}

/// On-disk shape of a catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub components: Vec<ComponentSpec>,

    #[serde(default)]
    pub groups: Vec<ComponentGroup>,

    #[serde(default)]
    pub options: Vec<GlobalOption>,
}

/// Collects definitions and validates them as a whole in [`CatalogBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    components: Vec<ComponentSpec>,
    groups: Vec<ComponentGroup>,
    options: Vec<GlobalOption>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component
    pub fn component(mut self, spec: ComponentSpec) -> Self {
        self.components.push(spec);
        self
    }

    /// Add a group
    pub fn group(mut self, group: ComponentGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Add a global option
    pub fn option(mut self, option: GlobalOption) -> Self {
        self.options.push(option);
        self
    }

    /// Validate everything and freeze it into a catalog
    pub fn build(self) -> Result<ComponentCatalog, CatalogError> {
        let mut components = BTreeMap::new();
        for spec in self.components {
            validate_name(&spec.name)?;
            validate_define(&spec.name, &spec.define_stem())?;
            if components.contains_key(&spec.name) {
                return Err(CatalogError::DuplicateComponent { name: spec.name });
            }
            components.insert(spec.name.clone(), spec);
        }

        // Dependencies can only be checked once every component is known
        for spec in components.values() {
            for dependency in &spec.depends_on {
                if dependency == &spec.name {
                    return Err(CatalogError::SelfDependency {
                        component: spec.name.clone(),
                    });
                }
                if !components.contains_key(dependency) {
                    return Err(CatalogError::UnknownDependency {
                        component: spec.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let mut groups = BTreeMap::new();
        for group in self.groups {
            validate_name(&group.name)?;
            validate_define(&group.name, &group.define)?;
            if group.members.is_empty() {
                return Err(CatalogError::EmptyGroup { group: group.name });
            }
            if let Some(member) = group.members.iter().find(|m| !components.contains_key(*m)) {
                return Err(CatalogError::UnknownGroupMember {
                    group: group.name.clone(),
                    member: member.clone(),
                });
            }
            if groups.contains_key(&group.name) {
                return Err(CatalogError::DuplicateGroup { name: group.name });
            }
            groups.insert(group.name.clone(), group);
        }

        let mut options = BTreeMap::new();
        for option in self.options {
            validate_name(&option.name)?;
            validate_define(&option.name, &option.define)?;
            for spec in components.values() {
                if FlagKind::iter().any(|kind| spec.flag_key(kind) == option.name) {
                    return Err(CatalogError::OptionConflict {
                        option: option.name,
                        component: spec.name.clone(),
                    });
                }
            }
            if options.contains_key(&option.name) {
                return Err(CatalogError::DuplicateOption { name: option.name });
            }
            options.insert(option.name.clone(), option);
        }

        Ok(ComponentCatalog {
            components,
            groups,
            options,
        })
    }
}

/// Read-only registry of known components.
///
/// There are no mutating methods; build a new catalog through
/// [`CatalogBuilder`] to change the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentCatalog {
    components: BTreeMap<String, ComponentSpec>,
    groups: BTreeMap<String, ComponentGroup>,
    options: BTreeMap<String, GlobalOption>,
}

impl ComponentCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Get a component by name
    pub fn lookup(&self, name: &str) -> Result<&ComponentSpec, CatalogError> {
        self.components
            .get(name)
            .ok_or_else(|| CatalogError::UnknownComponent {
                name: name.to_string(),
            })
    }

    /// Check if a component is registered
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Every registered component name
    pub fn all_names(&self) -> BTreeSet<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// All components, ordered by name
    pub fn components(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.values()
    }

    /// All groups, ordered by name
    pub fn groups(&self) -> impl Iterator<Item = &ComponentGroup> {
        self.groups.values()
    }

    /// All global options, ordered by name
    pub fn options(&self) -> impl Iterator<Item = &GlobalOption> {
        self.options.values()
    }

    /// Get a global option by its profile key
    pub fn option(&self, name: &str) -> Option<&GlobalOption> {
        self.options.get(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Parse and validate a JSON catalog
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(Self::try_from(file)?)
    }

    /// Load a catalog from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading component catalog");

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog from {:?}", path))?;
        let catalog = Self::from_json(&content)
            .with_context(|| format!("Invalid catalog in {:?}", path))?;

        info!(
            components = catalog.len(),
            groups = catalog.groups.len(),
            options = catalog.options.len(),
            "component catalog loaded"
        );
        Ok(catalog)
    }

    /// Export in the on-disk shape
    pub fn to_catalog_file(&self) -> CatalogFile {
        CatalogFile {
            components: self.components.values().cloned().collect(),
            groups: self.groups.values().cloned().collect(),
            options: self.options.values().cloned().collect(),
        }
    }

    /// The extension pack's own components.
    pub fn builtin() -> Self {
        Self::builder()
            // Debug helpers
            .component(
                ComponentSpec::builder("line3d", "Debug helper that draws lines in 3D")
                    .with_empty_variant()
                    .build(),
            )
            .component(
                ComponentSpec::builder("overlayinfo", "Debug helper that displays on-screen labels")
                    .with_empty_variant()
                    .define("OVERLAY_INFO")
                    .build(),
            )
            // General
            .component(
                ComponentSpec::builder("quantize", "Lossy compression of floats and rotation quaternions")
                    .build(),
            )
            // Nodes
            .component(
                ComponentSpec::builder("audiomaster", "Audio playback through stream player pools")
                    .define("AUDIO_MASTER")
                    .build(),
            )
            .component(
                ComponentSpec::builder("autointerpolate", "Node that interpolates its parent's transform")
                    .define("AUTO_INTERPOLATE")
                    .build(),
            )
            .component(ComponentSpec::builder("smooth2d", "2D interpolation node").build())
            .component(ComponentSpec::builder("smooth3d", "3D interpolation node").build())
            .component(
                ComponentSpec::builder("radial_impulse2d", "Applies an impulse to 2D bodies within a radius")
                    .build(),
            )
            .component(
                ComponentSpec::builder("radial_impulse3d", "Applies an impulse to 3D bodies within a radius")
                    .build(),
            )
            // UI
            .component(
                ComponentSpec::builder("accordion", "Categorised show/hide container").build(),
            )
            .component(
                ComponentSpec::builder("expandable_panel", "Side panel that expands to show pages")
                    .build(),
            )
            .component(
                ComponentSpec::builder("filedir_picker", "Line edit with a file/directory dialog button")
                    .define("FILEDIRPICKER")
                    .build(),
            )
            .component(
                ComponentSpec::builder("spin_slider", "SpinBox that shows a slider for bounded ranges")
                    .build(),
            )
            .component(
                ComponentSpec::builder("tabular_box", "Edits values through a tabular display")
                    .build(),
            )
            // Other
            .component(
                ComponentSpec::builder("database", "Relational database built on resources")
                    .depends_on("tabular_box")
                    .build(),
            )
            .group(
                ComponentGroup::new(
                    "interpolation",
                    "INTERPOLATION_DISABLED",
                    ["autointerpolate", "smooth2d", "smooth3d"],
                )
                .with_description("Shared interpolator used by the smoothing nodes"),
            )
            .group(
                ComponentGroup::new(
                    "ui",
                    "ALL_UI_DISABLED",
                    [
                        "accordion",
                        "expandable_panel",
                        "filedir_picker",
                        "spin_slider",
                        "tabular_box",
                    ],
                )
                .with_description("Custom control theme database and theme builder plugin"),
            )
            .option(GlobalOption::new(
                "force_no_editor",
                "EDITOR_DISABLED",
                "Remove every editor plugin from the build",
            ))
            .build()
            .expect("Builtin catalog should be valid") // Safe: hardcoded valid catalog
    }
}

impl TryFrom<CatalogFile> for ComponentCatalog {
    type Error = CatalogError;

    fn try_from(file: CatalogFile) -> Result<Self, Self::Error> {
        let builder = file
            .components
            .into_iter()
            .fold(CatalogBuilder::new(), CatalogBuilder::component);
        let builder = file.groups.into_iter().fold(builder, CatalogBuilder::group);
        file.options
            .into_iter()
            .fold(builder, CatalogBuilder::option)
            .build()
    }
}

fn validate_name(name: &str) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("name is empty")),
        Some(c) if !c.is_ascii_lowercase() => {
            return Err(invalid("must start with a lowercase letter"));
        }
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(invalid("only lowercase letters, digits and '_' are allowed"));
    }
    Ok(())
}

fn validate_define(owner: &str, define: &str) -> Result<(), CatalogError> {
    let valid = define.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && define
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CatalogError::InvalidDefine {
            owner: owner.to_string(),
            define: define.to_string(),
        })
    }
}

//! Value types shared by the catalog, profile and resolver.
//!
//! Flag values and build states are proper enums/newtypes instead of raw
//! strings and integers, so the resolver can match on them exhaustively.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

/// The two flags a component can carry in a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    /// `<component>_enabled`: whether the component is part of the build at all
    Enabled,
    /// `<component>_empty`: whether an enabled component is compiled as a stub
    Empty,
}

impl FlagKind {
    /// Key suffix, including the separating underscore
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Enabled => "_enabled",
            Self::Empty => "_empty",
        }
    }

    /// Build the profile key for `component`
    pub fn key_for(&self, component: &str) -> String {
        format!("{}{}", component, self.suffix())
    }
}

/// Per-component outcome handed to the build orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildState {
    /// Stripped from the build
    #[default]
    Excluded,
    /// Compiled in, but every entry point is a no-op
    Stub,
    /// Compiled in with its full behavior
    Full,
}

impl BuildState {
    /// Check if the component's symbols exist in the build (full or stub)
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Full | Self::Stub)
    }

    /// Derive the state from an already validated flag pair
    pub(crate) fn from_flags(enabled: bool, empty: bool) -> Self {
        match (enabled, empty) {
            (false, _) => Self::Excluded,
            (true, true) => Self::Stub,
            (true, false) => Self::Full,
        }
    }
}

/// Raised when a profile value is not exactly 0 or 1
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a valid flag value (expected 0 or 1)")]
pub struct FlagValueError(pub String);

/// A boolean flag parsed from an integer-like source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagValue(bool);

impl FlagValue {
    /// Convert to boolean
    pub fn as_bool(&self) -> bool {
        self.0
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl FromStr for FlagValue {
    type Err = FlagValueError;

    /// Accepts anything that reads as the integer 0 or 1 (`0`, `1`, `01`, `+1`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(0) => Ok(Self(false)),
            Ok(1) => Ok(Self(true)),
            _ => Err(FlagValueError(s.to_string())),
        }
    }
}

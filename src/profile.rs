//! Build profile files.
//!
//! A profile is a flat list of `<key> = <value>` lines:
//!
//! ```text
//! # Debug helper that draws lines in 3D
//! line3d_enabled = 1
//! line3d_empty = 0
//!
//! force_no_editor = 0   # trailing comments are allowed
//! ```
//!
//! Parsing only checks the line structure. Whether a key names a known
//! component and whether its value is 0/1 is decided by the resolver, so a
//! single resolution can report every problem in the file at once.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, info};

/// Structural problems in profile text. Line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileParseError {
    /// Non-comment line without `=`
    #[error("line {line}: expected '<key> = <value>', found '{content}'")]
    MissingSeparator { line: usize, content: String },

    /// `= 1` with nothing on the left
    #[error("line {line}: missing key before '='")]
    EmptyKey { line: usize },

    /// Same key assigned twice
    #[error("line {line}: key '{key}' was already set on line {first_line}")]
    DuplicateKey {
        line: usize,
        key: String,
        first_line: usize,
    },
}

/// One raw assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    /// Value exactly as written (trimmed), not yet validated
    pub value: String,

    /// Source line, when parsed from text
    pub line: Option<usize>,
}

/// Unvalidated flag-name to value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProfile {
    entries: BTreeMap<String, ProfileEntry>,
}

impl RawProfile {
    /// Create an empty profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing any earlier value
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(
            key.into(),
            ProfileEntry {
                value: value.to_string(),
                line: None,
            },
        );
    }

    /// Builder-style [`RawProfile::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Raw value of a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// Source line of a key
    pub fn line_of(&self, key: &str) -> Option<usize> {
        self.entries.get(key).and_then(|e| e.line)
    }

    /// Iterate over `(key, raw value)` in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.as_str(), e.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a profile from disk
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading build profile");

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile from {:?}", path))?;
        let profile: Self = content
            .parse()
            .with_context(|| format!("Failed to parse profile {:?}", path))?;

        info!(entries = profile.len(), "build profile loaded");
        Ok(profile)
    }
}

impl FromStr for RawProfile {
    type Err = ProfileParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut entries: BTreeMap<String, ProfileEntry> = BTreeMap::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line = index + 1;

            // Everything after '#' is a comment, whole-line or trailing
            let content = match raw_line.find('#') {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            }
            .trim();
            if content.is_empty() {
                continue;
            }

            let (key, value) =
                content
                    .split_once('=')
                    .ok_or_else(|| ProfileParseError::MissingSeparator {
                        line,
                        content: content.to_string(),
                    })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ProfileParseError::EmptyKey { line });
            }

            if let Some(first) = entries.get(key) {
                return Err(ProfileParseError::DuplicateKey {
                    line,
                    key: key.to_string(),
                    first_line: first.line.unwrap_or(line),
                });
            }
            entries.insert(
                key.to_string(),
                ProfileEntry {
                    value: value.trim().to_string(),
                    line: Some(line),
                },
            );
        }

        Ok(Self { entries })
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for RawProfile {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut profile = Self::new();
        for (key, value) in iter {
            profile.insert(key, value);
        }
        profile
    }
}

/// Renders in the on-disk format, one key per line in key order
impl fmt::Display for RawProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.iter() {
            writeln!(f, "{} = {}", key, value)?;
        }
        Ok(())
    }
}

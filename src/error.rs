//! Error handling module for featpack
//!
//! Module-level errors (`ProfileParseError`, `CatalogError`,
//! `ValidationReport`) stay precise; this enum unifies them for callers that
//! only need one error type.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::logic::resolver::ValidationReport;
use crate::profile::ProfileParseError;

/// Main error type for featpack
#[derive(Error, Debug)]
pub enum FeatpackError {
    /// Profile text is structurally broken
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileParseError),

    /// Catalog definition is inconsistent
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Profile parsed but violates the catalog
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationReport),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for featpack operations
pub type Result<T> = std::result::Result<T, FeatpackError>;

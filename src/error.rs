use thiserror::Error;

/// Fatal static-configuration defects.
///
/// These are detected once at startup when the canonical table and mapping
/// rule table are built, before any asset is validated. Per-asset problems
/// are never represented here; they are collected as
/// [`ValidationIssue`](crate::validate::ValidationIssue)s instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("canonical table must contain {expected} entries, found {found}")]
    WrongEntryCount { expected: usize, found: usize },

    #[error("duplicate canonical name '{name}'")]
    DuplicateCanonicalName { name: String },

    #[error("canonical entry index {index} out of order (expected {expected})")]
    IndexOutOfOrder { index: usize, expected: usize },

    #[error("rotation flag mismatch at canonical index {index}")]
    RotationFlagMismatch { index: usize },

    #[error("mapping rule table has no resolvable source pattern for '{name}'")]
    UnreachableCanonicalName { name: String },

    #[error("mapping rule '{pattern}' targets unknown canonical name '{canonical}'")]
    UnknownRuleTarget { pattern: String, canonical: String },
}

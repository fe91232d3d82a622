//! Error types for the inventory crate.

use ocfl_types::{ErrorKind, TypeError};

use crate::validation::ValidationReport;

/// Errors that can occur during inventory operations.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// A logical or content path is malformed.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A path collides with an existing path or one of its prefixes.
    #[error("path {path:?} conflicts with {existing:?}")]
    PathConflict { path: String, existing: String },

    /// The logical path is not part of the head state.
    #[error("logical path not found in head state: {0}")]
    PathNotFound(String),

    /// The digest is not part of the manifest.
    #[error("digest not found in manifest: {0}")]
    UnknownDigest(String),

    /// A digest value does not fit its algorithm.
    #[error("invalid {algorithm} digest: {digest}")]
    InvalidDigest { algorithm: String, digest: String },

    /// The primary digest is missing from the supplied digests.
    #[error("no {0} digest supplied")]
    MissingDigest(String),

    /// Mutation attempted on a finalized inventory.
    #[error("inventory is frozen")]
    Frozen,

    /// Mutation attempted before the first version was opened.
    #[error("inventory has no head version")]
    NoHead,

    /// The requested version does not exist.
    #[error("version not found: {0}")]
    VersionNotFound(String),

    /// Bad inventory parameters (algorithm, content directory, id).
    #[error("inventory configuration error: {0}")]
    Configuration(String),

    /// Version numbering failed.
    #[error("version error: {0}")]
    Version(#[from] TypeError),

    /// The inventory failed structural validation.
    #[error("inventory is invalid: {0}")]
    Invalid(ValidationReport),

    /// The sidecar digest does not match the inventory.
    #[error("inventory digest mismatch: expected {expected}, found {actual}")]
    SidecarMismatch { expected: String, actual: String },

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InventoryError {
    /// Classification in the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath { .. }
            | Self::PathConflict { .. }
            | Self::PathNotFound(_)
            | Self::VersionNotFound(_) => ErrorKind::Path,
            Self::UnknownDigest(_)
            | Self::InvalidDigest { .. }
            | Self::MissingDigest(_)
            | Self::Frozen
            | Self::NoHead
            | Self::Invalid(_)
            | Self::SidecarMismatch { .. } => ErrorKind::Integrity,
            Self::Configuration(_) | Self::Version(_) | Self::Json(_) => ErrorKind::Configuration,
        }
    }
}

/// Convenience alias for inventory results.
pub type InventoryResult<T> = Result<T, InventoryError>;

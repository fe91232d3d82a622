//! Deterministic storage layout algorithms.
//!
//! A layout maps an object identifier (or a logical file path) to a
//! filesystem-safe relative path. Every layout is pure: the same
//! configuration and input always produce byte-identical output, so
//! independent implementations agree on where an object lives.
//!
//! # Layouts
//!
//! | Type | Extension |
//! |---|---|
//! | [`FlatDirect`] | `0002-flat-direct-storage-layout` |
//! | [`HashAndIdNTuple`] | `0003-hash-and-id-n-tuple-storage-layout` |
//! | [`HashedNTuple`] | `0004-hashed-n-tuple-storage-layout` |
//! | [`FlatOmitPrefix`] | `0006-flat-omit-prefix-storage-layout` |
//! | [`NTupleOmitPrefix`] | `0007-n-tuple-omit-prefix-storage-layout` |
//! | [`PairTree`] | `NNNN-pairtree-storage-layout` |
//! | [`DirectClean`] | `NNNN-direct-clean-path-layout` |
//!
//! Each layout is built from a serde config struct using the camelCase
//! keys of its `config.json`.

pub mod direct_clean;
pub mod error;
pub mod flat_direct;
pub mod hash_and_id;
pub mod hashed_ntuple;
pub mod omit_prefix;
pub mod pairtree;
mod tuple;

pub use direct_clean::{DirectClean, DirectCleanConfig};
pub use error::{LayoutError, LayoutResult};
pub use flat_direct::{FlatDirect, FlatDirectConfig};
pub use hash_and_id::{HashAndIdNTuple, HashAndIdNTupleConfig};
pub use hashed_ntuple::{HashedNTuple, HashedNTupleConfig};
pub use omit_prefix::{
    FlatOmitPrefix, FlatOmitPrefixConfig, NTupleOmitPrefix, NTupleOmitPrefixConfig, ZeroPadding,
};
pub use pairtree::{PairTree, PairTreeConfig};

use std::fmt;

/// A deterministic id/path mapping.
///
/// Layouts used for the storage root implement
/// [`build_storage_root_path`](Self::build_storage_root_path); layouts used
/// inside objects implement
/// [`build_object_manifest_path`](Self::build_object_manifest_path). The
/// other method reports [`LayoutError::Unsupported`].
pub trait StorageLayout: Send + Sync + fmt::Debug {
    /// Registered extension name, e.g. `0004-hashed-n-tuple-storage-layout`.
    fn name(&self) -> &'static str;

    /// One-line human readable description, advertised in `ocfl_layout.json`.
    fn description(&self) -> &'static str;

    /// The configuration as it is persisted in `config.json`.
    fn config_json(&self) -> LayoutResult<serde_json::Value>;

    /// Map an object identifier to its directory below the storage root.
    fn build_storage_root_path(&self, id: &str) -> LayoutResult<String> {
        let _ = id;
        Err(LayoutError::Unsupported {
            layout: self.name(),
            operation: "storage root paths",
        })
    }

    /// Map a logical file path (within `area`) to its path inside the
    /// object's content directory.
    fn build_object_manifest_path(&self, logical_path: &str, area: &str) -> LayoutResult<String> {
        let _ = (logical_path, area);
        Err(LayoutError::Unsupported {
            layout: self.name(),
            operation: "object manifest paths",
        })
    }
}

pub(crate) fn require_id(id: &str) -> LayoutResult<()> {
    if id.is_empty() {
        return Err(LayoutError::input(id, "identifier must not be empty"));
    }
    Ok(())
}

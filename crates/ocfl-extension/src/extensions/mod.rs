//! Built-in extensions.
//!
//! | Extension | Capabilities |
//! |---|---|
//! | `0001-digest-algorithms` | FixityDigest |
//! | storage layouts (0002, 0003, 0004, 0006, 0007, pairtree) | StorageRootPath |
//! | `NNNN-direct-clean-path-layout` | StorageRootPath, ObjectContentPath |
//! | `NNNN-content-subpath` | Area, ObjectContentPath, ObjectStatePath, ObjectExtractPath |
//! | `NNNN-content-stats` | Stream, Metadata, ContentChange, ObjectChange, NewVersion |

pub mod content_stats;
pub mod content_subpath;
pub mod digest_algorithms;
pub mod layouts;

pub use content_stats::{ContentStats, ContentStatsConfig, FileStats};
pub use content_subpath::{ContentSubpath, ContentSubpathConfig, SubpathEntry};
pub use digest_algorithms::{DigestAlgorithms, DigestAlgorithmsConfig};
pub use layouts::LayoutExtension;

use ocfl_layout::{
    DirectClean, FlatDirect, FlatOmitPrefix, HashAndIdNTuple, HashedNTuple, NTupleOmitPrefix,
    PairTree,
};

use crate::error::{ExtensionError, ExtensionResult};

/// Every extension name the built-in factory can construct.
pub const BUILTIN_NAMES: [&str; 10] = [
    DigestAlgorithms::NAME,
    FlatDirect::NAME,
    HashAndIdNTuple::NAME,
    HashedNTuple::NAME,
    FlatOmitPrefix::NAME,
    NTupleOmitPrefix::NAME,
    PairTree::NAME,
    DirectClean::NAME,
    ContentSubpath::NAME,
    ContentStats::NAME,
];

pub(crate) fn check_name(found: &str, expected: &str) -> ExtensionResult<()> {
    if found != expected {
        return Err(ExtensionError::Configuration(format!(
            "expected extension {expected}, got {found}"
        )));
    }
    Ok(())
}

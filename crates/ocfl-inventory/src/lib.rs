//! The OCFL inventory: a versioned, content-addressable record of an
//! object.
//!
//! The manifest maps each content digest to the physical content paths
//! holding it (stored once, deduplicated). Each version's state maps
//! digests to the logical paths a user sees. Fixity blocks record
//! secondary digests of content paths.
//!
//! # Key Types
//!
//! - [`Inventory`] -- the inventory with its edit operations and JSON form
//! - [`DigestPathMap`] -- digest to path-set map (manifest, state, fixity)
//! - [`ValidationReport`] / [`ValidationIssue`] -- coded validation findings
//! - [`VersionDiff`] -- logical path changes between two versions

pub mod diff;
pub mod error;
pub mod inventory;
pub mod model;
pub mod validation;

pub use diff::{diff_states, PathChange, VersionDiff};
pub use error::{InventoryError, InventoryResult};
pub use inventory::{
    AddOutcome, Inventory, DEFAULT_CONTENT_DIRECTORY, INVENTORY_FILE, INVENTORY_TYPE,
};
pub use model::{validate_path, DigestPathMap, Fixity, Manifest, User, Version, VersionState};
pub use validation::{Severity, ValidationIssue, ValidationReport};

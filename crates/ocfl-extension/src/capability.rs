//! Capability traits and the tagged registry entry built from them.
//!
//! An extension advertises what it can do once, at registration, by
//! returning a list of [`Capability`] values. The manager never probes an
//! extension for a capability at dispatch time.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use ocfl_inventory::Inventory;
use ocfl_types::DigestAlgorithm;
use serde::{Deserialize, Serialize};

use crate::error::ExtensionResult;
use crate::session::Session;

/// The closed set of capabilities, used as keys in the manager config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityKind {
    StorageRootPath,
    ObjectContentPath,
    ObjectStatePath,
    ObjectExtractPath,
    ContentChange,
    ObjectChange,
    FixityDigest,
    Metadata,
    Area,
    Stream,
    NewVersion,
}

impl CapabilityKind {
    /// Every capability, in dispatch table order.
    pub const ALL: [CapabilityKind; 11] = [
        Self::StorageRootPath,
        Self::ObjectContentPath,
        Self::ObjectStatePath,
        Self::ObjectExtractPath,
        Self::ContentChange,
        Self::ObjectChange,
        Self::FixityDigest,
        Self::Metadata,
        Self::Area,
        Self::Stream,
        Self::NewVersion,
    ];
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Maps an object id to its directory below the storage root.
pub trait StorageRootPath: Send + Sync {
    fn build_storage_root_path(&self, id: &str) -> ExtensionResult<String>;
}

/// Maps a logical path to its content path inside the version's content
/// directory. An empty return leaves the path unchanged.
pub trait ObjectContentPath: Send + Sync {
    fn build_object_manifest_path(
        &self,
        session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String>;
}

/// Rewrites the logical path recorded in the version state.
pub trait ObjectStatePath: Send + Sync {
    fn build_object_state_path(
        &self,
        session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String>;
}

/// Maps a logical path to its location when a version is extracted.
pub trait ObjectExtractPath: Send + Sync {
    fn build_object_extract_path(
        &self,
        session: &Session,
        path: &str,
        area: &str,
    ) -> ExtensionResult<String>;
}

/// A completed edit of the head version state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentEvent {
    Added { path: String, digest: String },
    Deleted { path: String },
    Renamed { from: String, to: String },
    Copied { path: String, digest: String },
}

/// Observes every edit of the head state.
pub trait ContentChange: Send + Sync {
    fn content_change(&self, session: &mut Session, event: &ContentEvent) -> ExtensionResult<()>;
}

/// Hooks around persisting a new object version.
pub trait ObjectChange: Send + Sync {
    /// Runs before the inventory is written.
    fn update_object_before(
        &self,
        session: &mut Session,
        inventory: &Inventory,
    ) -> ExtensionResult<()>;

    /// Runs after the inventory and its sidecar are written.
    fn update_object_after(
        &self,
        session: &mut Session,
        inventory: &Inventory,
    ) -> ExtensionResult<()>;
}

/// Contributes fixity algorithms computed for every added file.
pub trait FixityDigest: Send + Sync {
    fn fixity_digests(&self) -> Vec<DigestAlgorithm>;
}

/// Exposes per-content metadata, keyed by primary digest.
pub trait Metadata: Send + Sync {
    fn metadata(
        &self,
        session: &Session,
        inventory: &Inventory,
    ) -> ExtensionResult<BTreeMap<String, serde_json::Value>>;
}

/// Maps a named area to a sub-directory. `None` when the area is not
/// handled by this extension.
pub trait Area: Send + Sync {
    fn area_path(&self, area: &str) -> Option<String>;
}

/// Consumes the bytes of every added file.
///
/// Runs on its own worker thread while the file is being stored. A returned
/// value is recorded in the session under the file's logical path.
pub trait Stream: Send + Sync {
    fn stream(
        &self,
        logical_path: &str,
        area: &str,
        reader: &mut dyn Read,
    ) -> ExtensionResult<Option<serde_json::Value>>;
}

/// Participates in opening a new version.
pub trait NewVersion: Send + Sync {
    /// Whether a version should be written even if the state is unchanged.
    fn needs_new_version(&self, session: &Session, inventory: &Inventory) -> bool;

    /// Runs once the new head version has been opened.
    fn do_new_version(&self, session: &mut Session, inventory: &Inventory) -> ExtensionResult<()>;
}

/// One declared capability of an extension.
#[derive(Clone)]
pub enum Capability {
    StorageRootPath(Arc<dyn StorageRootPath>),
    ObjectContentPath(Arc<dyn ObjectContentPath>),
    ObjectStatePath(Arc<dyn ObjectStatePath>),
    ObjectExtractPath(Arc<dyn ObjectExtractPath>),
    ContentChange(Arc<dyn ContentChange>),
    ObjectChange(Arc<dyn ObjectChange>),
    FixityDigest(Arc<dyn FixityDigest>),
    Metadata(Arc<dyn Metadata>),
    Area(Arc<dyn Area>),
    Stream(Arc<dyn Stream>),
    NewVersion(Arc<dyn NewVersion>),
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::StorageRootPath(_) => CapabilityKind::StorageRootPath,
            Self::ObjectContentPath(_) => CapabilityKind::ObjectContentPath,
            Self::ObjectStatePath(_) => CapabilityKind::ObjectStatePath,
            Self::ObjectExtractPath(_) => CapabilityKind::ObjectExtractPath,
            Self::ContentChange(_) => CapabilityKind::ContentChange,
            Self::ObjectChange(_) => CapabilityKind::ObjectChange,
            Self::FixityDigest(_) => CapabilityKind::FixityDigest,
            Self::Metadata(_) => CapabilityKind::Metadata,
            Self::Area(_) => CapabilityKind::Area,
            Self::Stream(_) => CapabilityKind::Stream,
            Self::NewVersion(_) => CapabilityKind::NewVersion,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability::{}", self.kind())
    }
}

/// A named unit of optional behavior.
///
/// Implementors are immutable once built; anything that changes while an
/// object is updated belongs in the [`Session`].
pub trait Extension: Send + Sync + 'static {
    /// Registered extension name, also the name of its config directory.
    fn name(&self) -> &str;

    /// Human readable summary.
    fn description(&self) -> &str {
        ""
    }

    /// Configuration as persisted in `<name>/config.json`.
    fn config_json(&self) -> ExtensionResult<serde_json::Value>;

    /// Every capability this extension provides.
    fn capabilities(self: Arc<Self>) -> Vec<Capability>;
}

//! Capability-based extension manager for OCFL objects and storage roots.
//!
//! Extensions declare a set of [`Capability`] values when they are added to
//! an [`ExtensionManagerBuilder`]. [`ExtensionManagerBuilder::finalize`]
//! applies the exclusion and sort rules of the [`ManagerConfig`] per
//! capability and produces an immutable [`ExtensionManager`], which
//! dispatches path mapping, hooks, metadata queries and byte streams to the
//! active extensions in order.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ocfl_extension::{ExtensionManagerBuilder, LayoutExtension};
//! use ocfl_layout::FlatDirect;
//!
//! let mut builder = ExtensionManagerBuilder::new();
//! builder.add(Arc::new(LayoutExtension::new(FlatDirect::new()))).unwrap();
//! let manager = builder.finalize().unwrap();
//! assert_eq!(manager.build_storage_root_path("object-01").unwrap(), "object-01");
//! ```
//!
//! Per-object state never lives on an extension: every hook receives the
//! update's [`Session`].

pub mod capability;
pub mod config;
pub mod error;
pub mod extensions;
pub mod factory;
pub mod manager;
pub mod session;

// Re-exports for convenience.
pub use capability::{
    Area, Capability, CapabilityKind, ContentChange, ContentEvent, Extension, FixityDigest,
    Metadata, NewVersion, ObjectChange, ObjectContentPath, ObjectExtractPath, ObjectStatePath,
    StorageRootPath, Stream,
};
pub use config::{ManagerConfig, MANAGER_NAME};
pub use error::{ExtensionError, ExtensionResult};
pub use extensions::{
    ContentStats, ContentStatsConfig, ContentSubpath, ContentSubpathConfig, DigestAlgorithms,
    DigestAlgorithmsConfig, FileStats, LayoutExtension, SubpathEntry, BUILTIN_NAMES,
};
pub use factory::{extension_name, Constructor, ExtensionFactory, CONFIG_FILE};
pub use manager::{ExtensionManager, ExtensionManagerBuilder, StreamSink, CONTENT_AREA, LAYOUT_FILE};
pub use session::Session;

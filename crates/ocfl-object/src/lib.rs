//! OCFL storage roots and object updates.
//!
//! A [`StorageRoot`] places objects with its layout extensions. Each update
//! of an object is an [`ObjectSession`]: it opens a new version, streams
//! added content through the digest and extension fan-outs once, and writes
//! the inventory on [`ObjectSession::commit`].
//!
//! ```rust
//! use std::sync::Arc;
//! use ocfl_extension::LayoutExtension;
//! use ocfl_fs::MemoryFs;
//! use ocfl_layout::FlatDirect;
//! use ocfl_object::{ObjectConfig, StorageRoot, VersionInfo};
//!
//! let root = StorageRoot::init(
//!     Arc::new(MemoryFs::new()),
//!     vec![Arc::new(LayoutExtension::new(FlatDirect::new()))],
//!     ObjectConfig::default(),
//! )
//! .unwrap();
//! let mut object = root.create_object("obj-1", &VersionInfo::new("first")).unwrap();
//! object.add_file("readme.txt", "", &mut &b"hello"[..]).unwrap();
//! object.commit().unwrap();
//! assert!(root.validate_object("obj-1").unwrap().is_valid());
//! ```

pub mod config;
pub mod error;
pub mod root;
pub mod session;
pub mod validate;
pub mod version;

pub use config::ObjectConfig;
pub use error::{ObjectError, ObjectResult};
pub use root::StorageRoot;
pub use session::ObjectSession;
pub use validate::validate_object;
pub use version::VersionInfo;

/// Declaration file of a storage root.
pub const ROOT_NAMASTE: &str = "0=ocfl_1.1";

/// Declaration file of an object.
pub const OBJECT_NAMASTE: &str = "0=ocfl_object_1.1";

/// Directory holding extension configs, in roots and objects alike.
pub const EXTENSIONS_DIR: &str = "extensions";

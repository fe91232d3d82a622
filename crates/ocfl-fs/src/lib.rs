//! Filesystem capability for the OCFL storage core.
//!
//! Everything above this crate (extensions, object sessions, the storage
//! root) talks to storage only through the [`Filesystem`] trait: read
//! (`open`, `stat`, `read_dir`) and, where writable, `create` and `delete`.
//! Concrete production backends (zip archives, S3) live outside this
//! workspace and only need to implement the trait.
//!
//! # Backends
//!
//! - [`MemoryFs`] -- `BTreeMap`-backed store for tests and embedding
//! - [`LocalFs`] -- a directory on local disk
//! - [`SubFs`] -- a view of a sub-tree of another filesystem
//!
//! # Paths
//!
//! Paths are relative, `/`-separated strings. Empty and `.` segments are
//! ignored; `..` is rejected so a sub-tree can never be escaped.

pub mod error;
pub mod local;
pub mod memory;
pub mod sub;
pub mod traits;

pub use error::{FsError, FsResult};
pub use local::LocalFs;
pub use memory::MemoryFs;
pub use sub::{sub_fs, SubFs};
pub use traits::{join_path, normalize_path, DirEntry, FileInfo, Filesystem};

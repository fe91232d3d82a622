//! Foundation types for the OCFL storage core.
//!
//! This crate provides the small set of value types shared by every other
//! crate in the workspace.
//!
//! # Key Types
//!
//! - [`DigestAlgorithm`]: Enumerated digest identifier (`sha512`, `blake2b-256`, ...)
//! - [`VersionNumber`]: OCFL version name (`v1`, `v2`, or zero-padded `v001`)
//! - [`ErrorKind`]: Error taxonomy shared by every crate's error enum
//! - [`ErrorList`]: Combined independent errors from a fan-out dispatch

pub mod digest;
pub mod error;
pub mod version;

pub use digest::DigestAlgorithm;
pub use error::{ErrorKind, ErrorList, TypeError};
pub use version::VersionNumber;

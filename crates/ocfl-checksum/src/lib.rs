//! Digest primitives for the OCFL storage core.
//!
//! Provides a factory for every [`DigestAlgorithm`] OCFL recognises, one-shot
//! helpers, and [`ChecksumWriter`]: a `Write` sink that computes several
//! digests concurrently while teeing the bytes to underlying writers.
//!
//! The concurrency lives in [`pipe`]: one worker thread per consumer, each
//! fed through its own rendezvous channel, joined on close. The same
//! primitive drives stream dispatch in the extension manager.
//!
//! All digest operations wrap the RustCrypto crates; no custom cryptography.

pub mod error;
pub mod hasher;
pub mod pipe;
pub mod writer;

pub use error::{ChecksumError, ChecksumResult};
pub use hasher::{digest_bytes, digest_reader, new_hasher, BoxedHasher};
pub use pipe::{FanOutGroup, PipeReader, WorkerOutcome};
pub use writer::{checksum_reader, ChecksumWriter};

pub use ocfl_types::DigestAlgorithm;

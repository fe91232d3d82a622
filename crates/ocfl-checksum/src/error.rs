use ocfl_types::{DigestAlgorithm, ErrorKind, ErrorList};

/// Errors from digest computation.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// Unsupported algorithm name or unusable algorithm list.
    #[error("checksum configuration error: {0}")]
    Configuration(String),

    /// I/O failure while reading input or writing to a teed writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A digest runner failed or went away before end of stream.
    #[error("digest runner for {algorithm} failed: {message}")]
    Runner {
        algorithm: DigestAlgorithm,
        message: String,
    },

    /// A write failed partway, so the digests may cover bytes that an
    /// underlying writer never accepted.
    #[error("a write to the checksum writer failed; digests are not usable")]
    WriteFailed,

    /// Digests were requested before `close()` completed.
    #[error("checksums requested before the writer was closed")]
    NotClosed,

    /// Several runners failed independently.
    #[error("{0}")]
    Aggregate(ErrorList<ChecksumError>),
}

impl ChecksumError {
    /// Classification in the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) => ErrorKind::Filesystem,
            Self::Runner { .. } | Self::WriteFailed | Self::NotClosed => ErrorKind::Integrity,
            Self::Aggregate(_) => ErrorKind::Aggregate,
        }
    }
}

/// Result alias for checksum operations.
pub type ChecksumResult<T> = Result<T, ChecksumError>;

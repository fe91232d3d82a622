use ocfl_types::ErrorKind;

/// Errors from filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// The requested file or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path is malformed or tries to leave the filesystem root.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A write operation was attempted on a read-only filesystem.
    #[error("filesystem is read-only")]
    ReadOnly,

    /// I/O error from the underlying backend.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal lock poisoned by a panicking writer.
    #[error("filesystem lock poisoned: {0}")]
    LockPoisoned(String),
}

impl FsError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path);
        }
        Self::Io { path, source }
    }

    /// Returns `true` for [`FsError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Classification in the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::InvalidPath { .. } => ErrorKind::Path,
            Self::ReadOnly | Self::Io { .. } | Self::LockPoisoned(_) => ErrorKind::Filesystem,
        }
    }
}

/// Result alias for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

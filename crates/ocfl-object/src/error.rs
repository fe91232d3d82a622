use ocfl_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("not an OCFL storage root: {0} is missing")]
    NotStorageRoot(String),

    #[error("storage root already initialized")]
    RootExists,

    #[error("object already exists: {0}")]
    ObjectExists(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("object directory of {expected} holds the inventory of {found}")]
    IdMismatch { expected: String, found: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("extension error: {0}")]
    Extension(#[from] ocfl_extension::ExtensionError),

    #[error("inventory error: {0}")]
    Inventory(#[from] ocfl_inventory::InventoryError),

    #[error("checksum error: {0}")]
    Checksum(#[from] ocfl_checksum::ChecksumError),

    #[error("filesystem error: {0}")]
    Fs(#[from] ocfl_fs::FsError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ObjectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotStorageRoot(_) | Self::RootExists | Self::Configuration(_) | Self::Json(_) => {
                ErrorKind::Configuration
            }
            Self::ObjectExists(_) | Self::ObjectNotFound(_) => ErrorKind::Path,
            Self::IdMismatch { .. } => ErrorKind::Integrity,
            Self::Extension(e) => e.kind(),
            Self::Inventory(e) => e.kind(),
            Self::Checksum(e) => e.kind(),
            Self::Fs(e) => e.kind(),
        }
    }
}

pub type ObjectResult<T> = Result<T, ObjectError>;

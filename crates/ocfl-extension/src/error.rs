use ocfl_fs::FsError;
use ocfl_inventory::InventoryError;
use ocfl_layout::LayoutError;
use ocfl_types::{ErrorKind, ErrorList};

/// Errors raised by extensions and by the extension manager.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    /// Manager or extension configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No constructor is registered for this extension name.
    #[error("unknown extension: {0}")]
    UnknownExtension(String),

    /// Two extensions with the same name were registered.
    #[error("extension registered twice: {0}")]
    Duplicate(String),

    /// No Area extension maps this area.
    #[error("unknown area: {0}")]
    UnknownArea(String),

    /// A path lies outside the area it was requested for.
    #[error("path {path:?} is outside area {area:?}")]
    OutsideArea { path: String, area: String },

    /// An extension failed; `source` carries the precise cause.
    #[error("extension {name}: {source}")]
    InExtension {
        name: String,
        #[source]
        source: Box<ExtensionError>,
    },

    /// A stream consumer panicked or exited without a result.
    #[error("stream consumer {name} failed: {message}")]
    Stream { name: String, message: String },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Several extensions failed independently.
    #[error("{0}")]
    Aggregate(ErrorList<ExtensionError>),
}

impl ExtensionError {
    /// Attach the name of the failing extension.
    pub fn in_extension(name: impl Into<String>, source: ExtensionError) -> Self {
        Self::InExtension {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Classification in the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_)
            | Self::UnknownExtension(_)
            | Self::Duplicate(_)
            | Self::Json(_) => ErrorKind::Configuration,
            Self::UnknownArea(_) | Self::OutsideArea { .. } => ErrorKind::Path,
            Self::InExtension { source, .. } => source.kind(),
            Self::Stream { .. } | Self::Io(_) => ErrorKind::Filesystem,
            Self::Layout(e) => e.kind(),
            Self::Fs(e) => e.kind(),
            Self::Inventory(e) => e.kind(),
            Self::Aggregate(_) => ErrorKind::Aggregate,
        }
    }
}

/// Result alias for extension operations.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

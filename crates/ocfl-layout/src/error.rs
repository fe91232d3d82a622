use ocfl_types::ErrorKind;

/// Errors from storage layout configuration and path building.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// Invalid layout parameters.
    #[error("layout configuration error: {0}")]
    Configuration(String),

    /// The configuration document could not be parsed.
    #[error("invalid layout config: {0}")]
    Json(#[from] serde_json::Error),

    /// The identifier or path cannot be mapped by this layout.
    #[error("cannot map {input:?}: {reason}")]
    InvalidInput { input: String, reason: String },

    /// The layout does not implement the requested mapping.
    #[error("layout {layout} does not support {operation}")]
    Unsupported {
        layout: &'static str,
        operation: &'static str,
    },
}

impl LayoutError {
    pub(crate) fn input(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Classification in the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::Json(_) => ErrorKind::Configuration,
            Self::InvalidInput { .. } | Self::Unsupported { .. } => ErrorKind::Path,
        }
    }
}

/// Result alias for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

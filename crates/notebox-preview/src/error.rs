//! Preview error types.

/// Errors from preview derivation.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// The input could not be parsed as a PDF.
    #[error("unparseable PDF: {0}")]
    Parse(String),

    /// The PDF parsed but its page tree is unusable.
    #[error("malformed page tree: {0}")]
    PageTree(String),

    /// The preview document could not be written.
    #[error("failed to serialize preview: {0}")]
    Serialize(String),
}

impl From<lopdf::Error> for PreviewError {
    fn from(e: lopdf::Error) -> Self {
        Self::PageTree(e.to_string())
    }
}

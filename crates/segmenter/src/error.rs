use thiserror::Error;

/// Segmentation errors
#[derive(Error, Debug)]
pub enum SegmenterError {
    /// Document is empty or whitespace-only
    #[error("Document is empty")]
    EmptyDocument,
}

/// Result type for segmentation operations
pub type Result<T> = std::result::Result<T, SegmenterError>;

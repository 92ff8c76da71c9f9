use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("segmentation error: {0}")]
    Segmenter(#[from] codesift_segmenter::SegmenterError),

    #[error("ingest error: {0}")]
    Ingest(#[from] codesift_sandbox::IngestError),

    #[error("unknown fragment: {0}")]
    UnknownFragment(Uuid),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Everything that can go wrong before a document reaches the pipeline
///
/// Each variant carries enough context to report the refusal without
/// echoing attacker-controlled bytes back verbatim.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("host is not fetchable: {host}")]
    BlockedHost { host: String },

    #[error("protocol {scheme} is not allowed")]
    InvalidProtocol { scheme: String },

    #[error("path escapes the sandbox: {name}")]
    PathTraversalAttempt { name: String },

    #[error("repository exceeds {limit} bytes")]
    OversizeRepository { limit: u64 },

    #[error("repository has more than {limit} text files")]
    TooManyFiles { limit: usize },

    #[error("fetch did not finish within {seconds}s")]
    FetchTimeout { seconds: u64 },

    #[error("unsupported file type: {name}")]
    UnsupportedFileType { name: String },

    #[error("upload is empty")]
    EmptyUpload,

    #[error("upload exceeds {limit} bytes")]
    OversizeUpload { limit: u64 },

    #[error("invalid repository url: {0}")]
    InvalidUrl(String),

    #[error("git clone failed: {0}")]
    CloneFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Stable machine-readable code for reports and API surfaces
    pub fn reason_code(&self) -> &'static str {
        match self {
            IngestError::BlockedHost { .. } => "blocked-host",
            IngestError::InvalidProtocol { .. } => "invalid-protocol",
            IngestError::PathTraversalAttempt { .. } => "path-traversal-attempt",
            IngestError::OversizeRepository { .. } => "oversize-repository",
            IngestError::TooManyFiles { .. } => "too-many-files",
            IngestError::FetchTimeout { .. } => "fetch-timeout",
            IngestError::UnsupportedFileType { .. } => "unsupported-file-type",
            IngestError::EmptyUpload => "empty-upload",
            IngestError::OversizeUpload { .. } => "oversize-upload",
            IngestError::InvalidUrl(_) => "invalid-url",
            IngestError::CloneFailed(_) => "clone-failed",
            IngestError::Io(_) => "io-error",
        }
    }
}

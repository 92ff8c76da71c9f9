use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::SystemTime;
use uuid::Uuid;

/// Lowercase-hex SHA-256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Where a document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "paste")]
    PastedText,
    #[serde(rename = "upload")]
    UploadedFile,
    #[serde(rename = "repo-file")]
    Repository,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::PastedText => "paste",
            SourceType::UploadedFile => "upload",
            SourceType::Repository => "repo-file",
        }
    }
}

/// Origin record attached to every ingested document
///
/// `origin` is human-oriented: the repository URL, the sanitized upload
/// name, or `"paste"`. It never contains a sandbox-local filesystem path.
/// `content_hash` is the SHA-256 of the document text as ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub source: SourceType,
    pub origin: String,
    pub content_hash: String,
    pub session_id: Option<Uuid>,
    pub ingested_at: SystemTime,
}

impl Provenance {
    pub fn new(
        source: SourceType,
        origin: impl Into<String>,
        session_id: Option<Uuid>,
        text: &str,
    ) -> Self {
        Self {
            source,
            origin: origin.into(),
            content_hash: sha256_hex(text.as_bytes()),
            session_id,
            ingested_at: SystemTime::now(),
        }
    }
}

/// A single text document ready for segmentation
///
/// `rel_path` is the path inside the repository for repository ingests and
/// the sanitized file name for uploads; pasted text has none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: Uuid,
    pub rel_path: Option<String>,
    pub text: String,
    pub byte_len: usize,
    pub provenance: Provenance,
}

impl RawDocument {
    pub fn new(rel_path: Option<String>, text: String, provenance: Provenance) -> Self {
        let byte_len = text.len();
        Self {
            id: Uuid::new_v4(),
            rel_path,
            text,
            byte_len,
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_records_byte_length_and_hash() {
        let text = "fn main() {}\n";
        let prov = Provenance::new(SourceType::PastedText, "paste", None, text);
        let doc = RawDocument::new(None, text.to_string(), prov);
        assert_eq!(doc.byte_len, 13);
        assert!(doc.rel_path.is_none());
        assert_eq!(doc.provenance.source.as_str(), "paste");
        assert_eq!(doc.provenance.content_hash.len(), 64);
        assert_eq!(doc.provenance.content_hash, sha256_hex(text.as_bytes()));
    }

    #[test]
    fn test_hash_is_stable_and_content_sensitive() {
        assert_eq!(sha256_hex(b"abc"), sha256_hex(b"abc"));
        assert_ne!(sha256_hex(b"abc"), sha256_hex(b"abd"));
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

use crate::secrets::SecretReport;
use codesift_language::{DetectionConfidence, Language};
use codesift_segmenter::{BlockType, SegmentPass};
use codesift_validator::Verdict;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Lifecycle state of a validated fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentStatus {
    Pending,
    Accepted,
    Rejected,
    Superseded,
}

impl FragmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FragmentStatus::Pending => "pending",
            FragmentStatus::Accepted => "accepted",
            FragmentStatus::Rejected => "rejected",
            FragmentStatus::Superseded => "superseded",
        }
    }
}

/// A fragment that has been through the full pipeline
///
/// `content` is a byte-exact slice of the normalized document covering
/// `start_line..=end_line`; `content_hash` is its SHA-256, the key under
/// which feedback and duplicates aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedFragment {
    pub id: Uuid,
    pub document_id: Uuid,
    pub language: Language,
    pub language_confidence: DetectionConfidence,
    pub block_type: BlockType,
    pub pass: SegmentPass,
    pub content: String,
    pub content_hash: String,
    pub start_line: usize,
    pub end_line: usize,
    pub verdict: Verdict,
    pub confidence: u8,
    pub status: FragmentStatus,
    pub secrets: SecretReport,
    /// First fragment seen with this content hash, when this is not it
    pub duplicate_of: Option<Uuid>,
    /// Fragment this one replaced via modify feedback
    pub supersedes: Option<Uuid>,
    pub created_at: SystemTime,
}

impl ValidatedFragment {
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesift_validator::ValidationTier;

    fn sample() -> ValidatedFragment {
        ValidatedFragment {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            language: Language::Python,
            language_confidence: DetectionConfidence::Medium,
            block_type: BlockType::Code,
            pass: SegmentPass::Keyword,
            content: "def f():\n    return 1".to_string(),
            content_hash: codesift_sandbox::sha256_hex(b"def f():\n    return 1"),
            start_line: 1,
            end_line: 2,
            verdict: Verdict::AstValid { node_count: 9 },
            confidence: 91,
            status: FragmentStatus::Pending,
            secrets: SecretReport {
                scanned: true,
                findings: Vec::new(),
            },
            duplicate_of: None,
            supersedes: None,
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn test_line_count_and_tier() {
        let frag = sample();
        assert_eq!(frag.line_count(), 2);
        assert_eq!(frag.verdict.tier(), Some(ValidationTier::Ast));
        assert!(frag.is_valid());
    }

    #[test]
    fn test_serialization_round_trip() {
        let frag = sample();
        let json = serde_json::to_string(&frag).unwrap();
        let back: ValidatedFragment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, frag.id);
        assert_eq!(back.content, frag.content);
        assert_eq!(back.status, frag.status);
    }
}

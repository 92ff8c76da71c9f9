//! Confidence scoring for validated fragments
//!
//! A fragment's confidence is a 0-100 integer derived from its validation
//! verdict, the language detector's certainty, the fragment's length, and
//! the running feedback tally for its content hash. Scores are recomputed
//! whenever a new feedback event lands, so they drift with usage rather
//! than being frozen at extraction time.

use codesift_language::DetectionConfidence;
use codesift_validator::Verdict;
use serde::{Deserialize, Serialize};

/// Running feedback tally for one content hash
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackTotals {
    pub accepts: u32,
    pub rejects: u32,
    pub modifies: u32,
}

impl FeedbackTotals {
    /// Signed score adjustment contributed by accumulated feedback
    pub fn adjustment(self) -> i64 {
        4 * i64::from(self.accepts) - 8 * i64::from(self.rejects) - 5 * i64::from(self.modifies)
    }

    pub fn is_empty(self) -> bool {
        self.accepts == 0 && self.rejects == 0 && self.modifies == 0
    }
}

/// Computes fragment confidence scores
///
/// The weights are fixed rather than configurable: scores are meaningful
/// to users only if the same fragment scores the same everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        ConfidenceScorer
    }

    /// Score a fragment from its verdict and context
    ///
    /// Rejected fragments always score 0 regardless of feedback; a reject
    /// verdict is not something usage history can argue with.
    pub fn score(
        &self,
        verdict: &Verdict,
        detection: DetectionConfidence,
        line_count: usize,
        totals: FeedbackTotals,
    ) -> u8 {
        let base: i64 = match verdict {
            Verdict::AstValid { .. } => 90,
            Verdict::PatternValid { .. } => 62,
            Verdict::Rejected { .. } => return 0,
        };

        let certainty: i64 = match detection {
            DetectionConfidence::High => 6,
            DetectionConfidence::Medium => 3,
            DetectionConfidence::Low => 0,
            DetectionConfidence::Unknown => -6,
        };

        let length: i64 = match line_count {
            0 | 1 => -5,
            2..=5 => -2,
            _ => 0,
        };

        (base + certainty + length + totals.adjustment()).clamp(0, 100) as u8
    }
}

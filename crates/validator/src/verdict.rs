use serde::{Deserialize, Serialize};

/// Validation tier a fragment passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationTier {
    /// Grammar parse with no error nodes
    Ast,
    /// Pattern/shape heuristics
    Pattern,
}

impl ValidationTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationTier::Ast => "ast",
            ValidationTier::Pattern => "pattern",
        }
    }
}

/// Which pattern check accepted a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternSignal {
    /// Parsed cleanly as JSON
    StructuredWellFormed,
    /// Key/value or sectioned configuration shape
    ConfigShape,
    /// Function/class/variable declaration pattern hit
    Declaration,
    /// Balanced delimiters plus technical density above the floor
    DensityFloor,
}

/// Why a fragment was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    /// Grammar parse exceeded the per-fragment time budget
    ParseTimeout,
    /// Brackets, braces, or parentheses do not balance
    UnbalancedDelimiters,
    /// Hinted as structured data but not well-formed
    MalformedStructure,
    /// No declaration, shape, or density signal present
    NoCodeSignal,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::ParseTimeout => "parse-timeout",
            RejectReason::UnbalancedDelimiters => "unbalanced-delimiters",
            RejectReason::MalformedStructure => "malformed-structure",
            RejectReason::NoCodeSignal => "no-code-signal",
        }
    }
}

/// Terminal validation state of a fragment
///
/// The variants carry their evidence: node counts for a clean parse, the
/// accepting signal (and any prior parse-error count) for a pattern pass,
/// and a reason for rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Verdict {
    AstValid {
        node_count: usize,
    },
    PatternValid {
        signal: PatternSignal,
        /// Error nodes seen in a preceding grammar parse, when one ran
        parse_errors: usize,
    },
    Rejected {
        reason: RejectReason,
    },
}

impl Verdict {
    /// Tier of a valid verdict; `None` for rejections
    pub fn tier(&self) -> Option<ValidationTier> {
        match self {
            Verdict::AstValid { .. } => Some(ValidationTier::Ast),
            Verdict::PatternValid { .. } => Some(ValidationTier::Pattern),
            Verdict::Rejected { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Verdict::Rejected { .. })
    }
}

//! # Codesift Language
//!
//! Language identification for extracted fragments.
//!
//! Detection is weighted voting over independent signals rather than a
//! single lookup:
//!
//! ```text
//! file extension ──┐ (strongest)
//! fence tag ───────┤
//! shebang line ────┼──> vote tally ──> Language + certainty
//! content markers ─┘ (weakest)
//! ```
//!
//! Ties resolve toward the extension vote. No signal at all yields
//! [`Language::Unknown`] with [`DetectionConfidence::Unknown`] rather than
//! an error, since downstream validation handles unknown-language fragments
//! on its own terms.
//!
//! ## Example
//!
//! ```rust
//! use codesift_language::LanguageDetector;
//!
//! let detector = LanguageDetector::new();
//! let detection = detector.detect(Some("script.py"), "def main():\n    pass\n", None);
//! assert_eq!(detection.language.as_str(), "python");
//! ```

mod detector;
mod language;

pub use detector::{
    Detection, DetectionConfidence, LanguageDetector, LanguageVote, VoteSource,
};
pub use language::Language;

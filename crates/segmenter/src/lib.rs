//! # Codesift Segmenter
//!
//! Splits a normalized document into an ordered, non-overlapping sequence of
//! candidate fragments covering the whole document.
//!
//! ## Passes
//!
//! ```text
//! Document text
//!     │
//!     ├──> 1. Section markers   (# ---- SECTION: NAME ----)
//!     ├──> 2. Fenced blocks     (``` with optional language tag)
//!     ├──> 3. Indented runs     (>= 4 spaces or tabs, density-gated)
//!     ├──> 4. Keyword blocks    (def / fn / class / import / ...)
//!     ├──> 5. Density windows   (technical-character scoring)
//!     ├──> 6. Whole-file fallback (nothing else fired, density floor)
//!     │
//!     └──> Prose coverage fill ──> CandidateFragment[]
//! ```
//!
//! Earlier passes claim lines; later passes never re-claim them. Whatever no
//! pass claims becomes prose coverage, so downstream stages see the full
//! document and decide what to discard. Passes operate on whole lines only:
//! an inline backtick span inside a prose sentence is never lifted out as a
//! candidate of its own.
//!
//! ## Example
//!
//! ```rust
//! use codesift_segmenter::{Segmenter, SegmenterConfig};
//!
//! let segmenter = Segmenter::new(SegmenterConfig::default());
//! let doc = "Intro text.\n\n```python\ndef f():\n    return 1\n\nprint(f())\n```\n";
//! let fragments = segmenter.segment(doc).unwrap();
//! assert!(fragments.iter().any(|f| f.fence_tag.as_deref() == Some("python")));
//! ```

mod config;
mod error;
mod segmenter;
mod types;

pub mod density;

pub use config::SegmenterConfig;
pub use error::{Result, SegmenterError};
pub use segmenter::Segmenter;
pub use types::{BlockType, CandidateFragment, SegmentPass};

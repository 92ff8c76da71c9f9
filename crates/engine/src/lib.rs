//! # Codesift Engine
//!
//! Drives untrusted text through extraction and keeps the results:
//!
//! ```text
//! paste / upload / repository
//!          │
//!          ▼
//!   IngestBoundary (codesift-sandbox)
//!          │ RawDocument
//!          ▼
//!   normalize ──> dedup (document hash) ──> Segmenter ──> LanguageDetector
//!                                                              │
//!                                                              ▼
//!                                            Validator ──> ConfidenceScorer
//!                                                              │
//!                                       SecretScanner ──> FragmentStore
//! ```
//!
//! Fragments carry their verdict, a 0-100 confidence, provenance, and any
//! secret findings. Accept / reject / modify feedback flows back into the
//! scores, aggregated by content hash so identical snippets rise and fall
//! together.
//!
//! ## Example
//!
//! ```rust
//! use codesift_engine::ExtractionPipeline;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pipeline = ExtractionPipeline::with_defaults();
//! let report = pipeline
//!     .ingest_text("def f():\n    return 1\n")
//!     .await
//!     .unwrap();
//! assert_eq!(report.fragments, 1);
//! assert_eq!(report.ast_valid, 1);
//! # }
//! ```

mod config;
mod dedup;
mod error;
mod feedback;
mod fragment;
mod limits;
mod normalize;
mod pipeline;
mod score;
mod secrets;
mod stats;
mod store;

pub use codesift_language::{Detection, DetectionConfidence, Language};
pub use codesift_sandbox::{IngestError, Provenance, RawDocument, SourceType};
pub use codesift_segmenter::{BlockType, SegmentPass, SegmenterConfig};
pub use codesift_validator::{
    PatternSignal, RejectReason, ValidationTier, ValidatorConfig, Verdict,
};

pub use config::EngineConfig;
pub use dedup::{Deduplicator, DocumentRecord, Sighting};
pub use error::{EngineError, Result};
pub use feedback::{FeedbackAction, FeedbackEvent, FeedbackLog};
pub use fragment::{FragmentStatus, ValidatedFragment};
pub use limits::validation_concurrency_limit;
pub use normalize::normalize;
pub use pipeline::{ExtractionPipeline, FeedbackOutcome, FeedbackRequest};
pub use score::{ConfidenceScorer, FeedbackTotals};
pub use secrets::{SecretFinding, SecretKind, SecretReport, SecretScanner};
pub use stats::{BatchReport, ExtractionReport};
pub use store::{ExportFilter, FragmentStore};

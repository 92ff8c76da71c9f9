//! # Codesift Sandbox
//!
//! The zero-trust ingest boundary. All outside content (pasted text,
//! uploaded files, cloned repositories) enters through here and nowhere
//! else.
//!
//! ```text
//! paste ──────────┐
//! upload ─────────┼──> IngestBoundary ──> RawDocument[] ──> pipeline
//! repository URL ─┘         │
//!                           ├─ FetchPolicy      scheme + host screening,
//!                           │                   resolved before connect
//!                           ├─ SandboxSession   isolated dir, wiped on
//!                           │                   every exit path
//!                           └─ RepoFetcher      shallow clone, exec bits
//!                                               stripped, size-capped
//! ```
//!
//! Guarantees:
//! - nothing ingested is ever executed; uploads and clones lose their
//!   execute bits on arrival
//! - loopback, private, link-local, and unique-local destinations are
//!   refused before any connection is opened
//! - upload names that smuggle separators or `..` are refused, not cleaned
//! - a session directory never outlives its [`SandboxSession`] value
//!
//! ## Example
//!
//! ```rust
//! use codesift_sandbox::IngestBoundary;
//!
//! let boundary = IngestBoundary::with_defaults();
//! let batch = boundary.ingest_text("def f():\n    return 1\n").unwrap();
//! assert_eq!(batch.documents.len(), 1);
//! ```

mod document;
mod error;
mod ingest;
mod paths;
mod policy;
mod repo;
mod session;

pub use document::{sha256_hex, Provenance, RawDocument, SourceType};
pub use error::{IngestError, Result};
pub use ingest::{IngestBatch, IngestBoundary, IngestLimits};
pub use paths::{contained_join, sanitize_file_name};
pub use policy::FetchPolicy;
pub use repo::{RepoFetcher, RepoFile, RepoLimits};
pub use session::{SandboxManager, SandboxSession};

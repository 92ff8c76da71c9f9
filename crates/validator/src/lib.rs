//! # Codesift Validator
//!
//! Tiered validation of candidate fragments.
//!
//! ```text
//! CandidateFragment
//!     │
//!     ├──> Tier 1: grammar parse (tree-sitter, registered languages)
//!     │        ├─ clean parse ────────────> AstValid
//!     │        ├─ error nodes ──┐
//!     │        └─ timeout ──────┼────────> Rejected (timeout)
//!     │                         │
//!     ├──> Tier 2: pattern checks <────────┘  (also the direct path for
//!     │        ├─ structured well-formedness   unknown-language fragments)
//!     │        ├─ config shape
//!     │        ├─ declaration patterns
//!     │        └─ density floor
//!     │             │
//!     └──> Rejected (with reason) <─ no signal
//! ```
//!
//! Every fragment lands in exactly one terminal state: [`Verdict::AstValid`],
//! [`Verdict::PatternValid`], or [`Verdict::Rejected`]. A failed grammar
//! parse falls through to the pattern tier rather than rejecting outright;
//! only a parse *timeout* rejects from tier 1. Validation never aborts the
//! surrounding request.

mod ast;
mod pattern;
mod registry;
mod validator;
mod verdict;

pub use registry::GrammarRegistry;
pub use validator::{Validator, ValidatorConfig};
pub use verdict::{
    PatternSignal, RejectReason, ValidationTier, Verdict,
};

use codesift_validator::Verdict;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Statistics for one extracted document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Document the report describes
    pub document_id: Uuid,

    /// Fragments stored, every verdict included
    pub fragments: usize,

    /// Fragments that parsed cleanly
    pub ast_valid: usize,

    /// Fragments accepted by pattern heuristics
    pub pattern_valid: usize,

    /// Fragments rejected outright
    pub rejected: usize,

    /// Prose candidates discarded before validation
    pub prose_discarded: usize,

    /// Secret matches across all fragments
    pub secret_findings: usize,

    /// Fragments flagged because the secret scan was skipped
    pub unscanned: usize,

    /// Original document when this ingest was a duplicate body
    pub duplicate_of: Option<Uuid>,

    /// Fragment counts per detected language
    pub languages: HashMap<String, usize>,

    /// Time taken in milliseconds
    pub time_ms: u64,
}

impl ExtractionReport {
    pub fn new(document_id: Uuid) -> Self {
        Self {
            document_id,
            fragments: 0,
            ast_valid: 0,
            pattern_valid: 0,
            rejected: 0,
            prose_discarded: 0,
            secret_findings: 0,
            unscanned: 0,
            duplicate_of: None,
            languages: HashMap::new(),
            time_ms: 0,
        }
    }

    pub fn duplicate(document_id: Uuid, original: Uuid) -> Self {
        let mut report = Self::new(document_id);
        report.duplicate_of = Some(original);
        report
    }

    pub fn add_fragment(&mut self, verdict: &Verdict, language: &str) {
        self.fragments += 1;
        match verdict {
            Verdict::AstValid { .. } => self.ast_valid += 1,
            Verdict::PatternValid { .. } => self.pattern_valid += 1,
            Verdict::Rejected { .. } => self.rejected += 1,
        }
        *self.languages.entry(language.to_string()).or_insert(0) += 1;
    }

    pub fn add_prose(&mut self, count: usize) {
        self.prose_discarded += count;
    }

    pub fn add_secret_findings(&mut self, count: usize, scanned: bool) {
        self.secret_findings += count;
        if !scanned {
            self.unscanned += 1;
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.duplicate_of.is_some()
    }
}

impl Default for ExtractionReport {
    fn default() -> Self {
        Self::new(Uuid::nil())
    }
}

/// Aggregated statistics for a multi-document ingest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Documents that went through extraction
    pub documents: usize,

    /// Documents skipped as duplicate bodies
    pub duplicates: usize,

    /// Fragments stored across the batch
    pub fragments: usize,

    /// Clean-parse fragments across the batch
    pub ast_valid: usize,

    /// Pattern-tier fragments across the batch
    pub pattern_valid: usize,

    /// Rejected fragments across the batch
    pub rejected: usize,

    /// Prose candidates discarded across the batch
    pub prose_discarded: usize,

    /// Secret matches across the batch
    pub secret_findings: usize,

    /// Fragment counts per detected language
    pub languages: HashMap<String, usize>,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Per-document breakdown, ingest order
    pub reports: Vec<ExtractionReport>,

    /// Documents that failed before extraction
    pub errors: Vec<String>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self {
            documents: 0,
            duplicates: 0,
            fragments: 0,
            ast_valid: 0,
            pattern_valid: 0,
            rejected: 0,
            prose_discarded: 0,
            secret_findings: 0,
            languages: HashMap::new(),
            time_ms: 0,
            reports: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record(&mut self, report: ExtractionReport) {
        if report.is_duplicate() {
            self.duplicates += 1;
        } else {
            self.documents += 1;
        }
        self.fragments += report.fragments;
        self.ast_valid += report.ast_valid;
        self.pattern_valid += report.pattern_valid;
        self.rejected += report.rejected;
        self.prose_discarded += report.prose_discarded;
        self.secret_findings += report.secret_findings;
        for (language, count) in &report.languages {
            *self.languages.entry(language.clone()).or_insert(0) += count;
        }
        self.reports.push(report);
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

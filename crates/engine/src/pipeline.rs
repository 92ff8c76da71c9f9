//! The extraction pipeline
//!
//! One struct wires the stages together: normalize → segment → detect →
//! validate → score → secret-scan → dedup → record. Ingest always goes
//! through the sandbox boundary; nothing reaches the segmenter that was
//! not screened first.
//!
//! Validation is the expensive stage, so candidates fan out onto blocking
//! threads behind a process-wide semaphore while everything on either
//! side stays sequential. Bookkeeping (dedup ledger, feedback log) sits
//! behind one mutex; fragments live in the store's own lock.

use crate::config::EngineConfig;
use crate::dedup::Deduplicator;
use crate::error::{EngineError, Result};
use crate::feedback::{FeedbackAction, FeedbackEvent, FeedbackLog};
use crate::fragment::{FragmentStatus, ValidatedFragment};
use crate::limits::{acquire_validation_permit, validation_concurrency_limit};
use crate::normalize::normalize;
use crate::score::{ConfidenceScorer, FeedbackTotals};
use crate::secrets::{SecretReport, SecretScanner};
use crate::stats::{BatchReport, ExtractionReport};
use crate::store::{ExportFilter, FragmentStore};
use codesift_language::{Detection, DetectionConfidence, Language, LanguageDetector};
use codesift_sandbox::{sha256_hex, IngestBatch, IngestBoundary, RawDocument, SandboxManager};
use codesift_segmenter::{BlockType, CandidateFragment, Segmenter, SegmenterError};
use codesift_validator::{Validator, Verdict};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Instant, SystemTime};
use uuid::Uuid;

/// A caller's judgement on one fragment
#[derive(Debug, Clone)]
pub enum FeedbackRequest {
    Accept {
        fragment_id: Uuid,
    },
    Reject {
        fragment_id: Uuid,
    },
    /// Corrected content replaces the fragment; the original is kept but
    /// marked superseded
    Modify {
        fragment_id: Uuid,
        corrected_content: String,
        corrected_language: Option<Language>,
        corrected_block_type: Option<BlockType>,
    },
}

/// What a feedback application produced
#[derive(Debug, Clone)]
pub struct FeedbackOutcome {
    /// The fragment after the event: updated in place for accept and
    /// reject, the replacement fragment for modify
    pub fragment: ValidatedFragment,
    pub event_id: Uuid,
}

/// Dedup ledger and feedback log, mutated together
struct EngineState {
    dedup: Deduplicator,
    feedback: FeedbackLog,
}

/// Ingest-to-store pipeline over one in-memory fragment store
pub struct ExtractionPipeline {
    config: EngineConfig,
    boundary: IngestBoundary,
    segmenter: Segmenter,
    validator: Arc<Validator>,
    scanner: Arc<SecretScanner>,
    scorer: ConfidenceScorer,
    store: FragmentStore,
    state: Mutex<EngineState>,
}

impl ExtractionPipeline {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(Self::build(config))
    }

    pub fn with_defaults() -> Self {
        Self::build(EngineConfig::default())
    }

    fn build(config: EngineConfig) -> Self {
        let boundary = IngestBoundary::new(
            SandboxManager::system_default(),
            config.fetch.clone(),
            config.ingest.clone(),
        );
        log::debug!(
            "pipeline ready, validation concurrency {}",
            validation_concurrency_limit()
        );
        Self {
            boundary,
            segmenter: Segmenter::new(config.segmenter.clone()),
            validator: Arc::new(Validator::new(config.validator.clone())),
            scanner: Arc::new(SecretScanner::new(config.secret_scan_cap_bytes)),
            scorer: ConfidenceScorer::new(),
            store: FragmentStore::new(),
            state: Mutex::new(EngineState {
                dedup: Deduplicator::new(),
                feedback: FeedbackLog::new(),
            }),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn boundary(&self) -> &IngestBoundary {
        &self.boundary
    }

    /// Extract from pasted text
    pub async fn ingest_text(&self, text: &str) -> Result<ExtractionReport> {
        let batch = self.boundary.ingest_text(text)?;
        self.single_document(batch).await
    }

    /// Extract from one uploaded file
    pub async fn ingest_file(&self, name: &str, bytes: &[u8]) -> Result<ExtractionReport> {
        let batch = self.boundary.ingest_file(name, bytes)?;
        self.single_document(batch).await
    }

    /// Clone a repository and extract from every collected file
    pub async fn ingest_repository(&self, url: &str) -> Result<BatchReport> {
        let batch = self.boundary.ingest_repository(url).await?;
        self.run_batch(batch).await
    }

    async fn single_document(&self, batch: IngestBatch) -> Result<ExtractionReport> {
        let IngestBatch {
            mut documents,
            session,
        } = batch;
        let result = match documents.pop() {
            Some(document) => self.process_document(document).await,
            None => Err(codesift_sandbox::IngestError::EmptyUpload.into()),
        };
        if let Some(session) = session {
            if let Err(err) = session.close() {
                log::warn!("session wipe after ingest: {err}");
            }
        }
        result
    }

    async fn run_batch(&self, batch: IngestBatch) -> Result<BatchReport> {
        let started = Instant::now();
        let IngestBatch { documents, session } = batch;
        let mut report = BatchReport::new();

        for document in documents {
            let document_id = document.id;
            let origin = document.rel_path.clone();
            match self.process_document(document).await {
                Ok(doc_report) => report.record(doc_report),
                Err(err) => {
                    let label = origin.unwrap_or_else(|| document_id.to_string());
                    log::warn!("document {label} failed: {err}");
                    report.add_error(format!("{label}: {err}"));
                }
            }
        }

        if let Some(session) = session {
            if let Err(err) = session.close() {
                log::warn!("session wipe after batch: {err}");
            }
        }
        report.time_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Run one document through segmentation, validation, and recording
    pub async fn process_document(&self, document: RawDocument) -> Result<ExtractionReport> {
        let started = Instant::now();
        let normalized = normalize(&document.text);
        let document_hash = sha256_hex(normalized.as_bytes());

        // A body seen before records a sighting and nothing else
        {
            let mut state = self.lock_state();
            if let Some(record) = state.dedup.record_document(
                &document_hash,
                document.id,
                &document.provenance.origin,
            ) {
                let original = record.document_id;
                log::debug!(
                    "document {} duplicates {original}, sighting {}",
                    document.id,
                    record.sightings.len()
                );
                let mut report = ExtractionReport::duplicate(document.id, original);
                report.time_ms = started.elapsed().as_millis() as u64;
                return Ok(report);
            }
        }

        let candidates = self.segmenter.segment(&normalized)?;
        let (prose, code): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(CandidateFragment::is_prose);

        let mut report = ExtractionReport::new(document.id);
        report.add_prose(prose.len());

        let outcomes = self.validate_candidates(&document, code).await;

        let mut fragment_ids = Vec::with_capacity(outcomes.len());
        {
            let mut state = self.lock_state();
            for (candidate, detection, verdict, secrets) in outcomes {
                let id = Uuid::new_v4();
                let content_hash = sha256_hex(candidate.text.as_bytes());
                let totals = state.feedback.totals_for(&content_hash);
                let confidence = self.scorer.score(
                    &verdict,
                    detection.confidence,
                    candidate.line_count(),
                    totals,
                );
                let duplicate_of = state.dedup.link_fragment(&content_hash, id);

                report.add_fragment(&verdict, detection.language.as_str());
                report.add_secret_findings(secrets.findings.len(), secrets.scanned);

                self.store.insert(ValidatedFragment {
                    id,
                    document_id: document.id,
                    language: detection.language,
                    language_confidence: detection.confidence,
                    block_type: candidate.hint,
                    pass: candidate.pass,
                    content: candidate.text,
                    content_hash,
                    start_line: candidate.start_line,
                    end_line: candidate.end_line,
                    verdict,
                    confidence,
                    status: FragmentStatus::Pending,
                    secrets,
                    duplicate_of,
                    supersedes: None,
                    created_at: SystemTime::now(),
                });
                fragment_ids.push(id);
            }
            state.dedup.attach_fragments(&document_hash, fragment_ids);
        }

        report.time_ms = started.elapsed().as_millis() as u64;
        log::debug!(
            "document {}: {} fragments ({} ast, {} pattern, {} rejected), {} prose discarded",
            document.id,
            report.fragments,
            report.ast_valid,
            report.pattern_valid,
            report.rejected,
            report.prose_discarded
        );
        Ok(report)
    }

    /// Fan candidates out onto blocking threads, bounded by the semaphore
    ///
    /// Results come back in candidate order. A panicked worker loses that
    /// candidate only; the document keeps going.
    async fn validate_candidates(
        &self,
        document: &RawDocument,
        candidates: Vec<CandidateFragment>,
    ) -> Vec<(CandidateFragment, Detection, Verdict, SecretReport)> {
        let mut tasks = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let validator = Arc::clone(&self.validator);
            let scanner = Arc::clone(&self.scanner);
            let rel_path = document.rel_path.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = acquire_validation_permit().await;
                tokio::task::spawn_blocking(move || {
                    let detection = LanguageDetector::new().detect(
                        rel_path.as_deref(),
                        &candidate.text,
                        candidate.fence_tag.as_deref(),
                    );
                    let verdict = validator.validate(&candidate, detection.language);
                    let secrets = scanner.scan(&candidate.text);
                    (candidate, detection, verdict, secrets)
                })
                .await
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(join_err)) | Err(join_err) => {
                    log::error!("validation worker failed, candidate dropped: {join_err}");
                }
            }
        }
        outcomes
    }

    /// Apply one feedback event and return the resulting fragment
    pub fn apply_feedback(&self, request: FeedbackRequest) -> Result<FeedbackOutcome> {
        match request {
            FeedbackRequest::Accept { fragment_id } => {
                self.record_judgement(fragment_id, FeedbackAction::Accept, FragmentStatus::Accepted)
            }
            FeedbackRequest::Reject { fragment_id } => {
                self.record_judgement(fragment_id, FeedbackAction::Reject, FragmentStatus::Rejected)
            }
            FeedbackRequest::Modify {
                fragment_id,
                corrected_content,
                corrected_language,
                corrected_block_type,
            } => self.record_modify(
                fragment_id,
                corrected_content,
                corrected_language,
                corrected_block_type,
            ),
        }
    }

    fn record_judgement(
        &self,
        fragment_id: Uuid,
        action: FeedbackAction,
        status: FragmentStatus,
    ) -> Result<FeedbackOutcome> {
        let fragment = self
            .store
            .get(fragment_id)
            .ok_or(EngineError::UnknownFragment(fragment_id))?;

        let event = FeedbackEvent::new(fragment_id, fragment.content_hash.clone(), action);
        let event_id = event.id;
        let totals = {
            let mut state = self.lock_state();
            state.feedback.record(event);
            state.feedback.totals_for(&fragment.content_hash)
        };

        let scorer = self.scorer;
        let updated = self.store.update(fragment_id, |f| {
            f.status = status;
            f.confidence = scorer.score(&f.verdict, f.language_confidence, f.line_count(), totals);
        })?;
        self.refresh_siblings(&fragment.content_hash, fragment_id, totals)?;

        Ok(FeedbackOutcome {
            fragment: updated,
            event_id,
        })
    }

    fn record_modify(
        &self,
        fragment_id: Uuid,
        corrected_content: String,
        corrected_language: Option<Language>,
        corrected_block_type: Option<BlockType>,
    ) -> Result<FeedbackOutcome> {
        let old = self
            .store
            .get(fragment_id)
            .ok_or(EngineError::UnknownFragment(fragment_id))?;

        let content = normalize(&corrected_content);
        if content.trim().is_empty() {
            return Err(SegmenterError::EmptyDocument.into());
        }

        let mut event =
            FeedbackEvent::new(fragment_id, old.content_hash.clone(), FeedbackAction::Modify);
        event.corrected_language = corrected_language;
        event.corrected_block_type = corrected_block_type;
        let event_id = event.id;

        // The replacement keeps the original's position in its document
        let line_count = content.lines().count().max(1);
        let candidate = CandidateFragment {
            start_line: old.start_line,
            end_line: old.start_line + line_count - 1,
            text: content,
            hint: corrected_block_type.unwrap_or(old.block_type),
            pass: old.pass,
            fence_tag: None,
        };

        let detection = LanguageDetector::new().detect(None, &candidate.text, None);
        // A human correction outranks anything the detector voted for
        let (language, language_confidence) = match corrected_language {
            Some(language) => (language, DetectionConfidence::High),
            None => (detection.language, detection.confidence),
        };

        let verdict = self.validator.validate(&candidate, language);
        let secrets = self.scanner.scan(&candidate.text);
        let content_hash = sha256_hex(candidate.text.as_bytes());

        let new_id = Uuid::new_v4();
        let (new_totals, old_totals, duplicate_of) = {
            let mut state = self.lock_state();
            state.feedback.record(event);
            (
                state.feedback.totals_for(&content_hash),
                state.feedback.totals_for(&old.content_hash),
                state.dedup.link_fragment(&content_hash, new_id),
            )
        };

        let scorer = self.scorer;
        self.store.update(fragment_id, |f| {
            f.status = FragmentStatus::Superseded;
            f.confidence =
                scorer.score(&f.verdict, f.language_confidence, f.line_count(), old_totals);
        })?;
        self.refresh_siblings(&old.content_hash, fragment_id, old_totals)?;

        let confidence = self.scorer.score(
            &verdict,
            language_confidence,
            candidate.line_count(),
            new_totals,
        );
        let fragment = ValidatedFragment {
            id: new_id,
            document_id: old.document_id,
            language,
            language_confidence,
            block_type: candidate.hint,
            pass: candidate.pass,
            content: candidate.text,
            content_hash,
            start_line: candidate.start_line,
            end_line: candidate.end_line,
            verdict,
            confidence,
            status: FragmentStatus::Pending,
            secrets,
            duplicate_of,
            supersedes: Some(fragment_id),
            created_at: SystemTime::now(),
        };
        self.store.insert(fragment.clone());

        Ok(FeedbackOutcome { fragment, event_id })
    }

    /// Rescore every other fragment sharing a content hash
    ///
    /// Feedback aggregates by content, so siblings' stored scores go stale
    /// the moment an event lands; this brings them back in line.
    fn refresh_siblings(
        &self,
        content_hash: &str,
        except: Uuid,
        totals: FeedbackTotals,
    ) -> Result<()> {
        let scorer = self.scorer;
        for id in self.store.ids_for_hash(content_hash) {
            if id == except {
                continue;
            }
            self.store.update(id, |f| {
                f.confidence =
                    scorer.score(&f.verdict, f.language_confidence, f.line_count(), totals);
            })?;
        }
        Ok(())
    }

    /// Filtered, deterministically ordered snapshot of the store
    pub fn export(&self, filter: &ExportFilter) -> Vec<ValidatedFragment> {
        self.store.export(filter)
    }

    pub fn fragment(&self, id: Uuid) -> Option<ValidatedFragment> {
        self.store.get(id)
    }

    pub fn fragments_for_document(&self, document_id: Uuid) -> Vec<ValidatedFragment> {
        self.store.for_document(document_id)
    }

    pub fn stored_fragments(&self) -> usize {
        self.store.len()
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

use codesift_engine::{
    EngineError, ExportFilter, ExtractionPipeline, FeedbackRequest, FragmentStatus,
};
use codesift_language::{DetectionConfidence, Language};
use pretty_assertions::assert_eq;
use uuid::Uuid;

const PASTE: &str = "def f():\n    return 1\n\nThis is prose.\n";

const TWO_FUNCTIONS: &str = "def alpha():\n    return 1\n\n\
Some words in between explain things.\n\n\
def beta():\n    return 2\n";

#[tokio::test]
async fn paste_extraction_keeps_code_and_discards_prose() {
    let pipeline = ExtractionPipeline::with_defaults();
    let report = pipeline.ingest_text(PASTE).await.expect("paste ingest");

    assert_eq!(report.fragments, 1, "exactly one code fragment expected");
    assert_eq!(report.ast_valid, 1);
    assert!(report.prose_discarded >= 1, "the prose line should be dropped");
    assert_eq!(report.languages.get("python"), Some(&1));

    let fragments = pipeline.export(&ExportFilter::default());
    assert_eq!(fragments.len(), 1);
    let fragment = &fragments[0];
    assert_eq!((fragment.start_line, fragment.end_line), (1, 2));
    assert_eq!(fragment.content, "def f():\n    return 1");
    assert_eq!(fragment.language, Language::Python);
    assert!(fragment.is_valid());
    assert!(
        fragment.confidence >= 90,
        "clean two-line parse should score at least 90, got {}",
        fragment.confidence
    );
}

#[tokio::test]
async fn re_ingesting_identical_text_records_a_sighting_not_a_second_set() {
    let pipeline = ExtractionPipeline::with_defaults();
    let first = pipeline.ingest_text(PASTE).await.expect("first ingest");
    let stored = pipeline.stored_fragments();

    let second = pipeline.ingest_text(PASTE).await.expect("second ingest");
    assert!(second.is_duplicate());
    assert_eq!(second.duplicate_of, Some(first.document_id));
    assert_eq!(second.fragments, 0, "duplicates must not re-extract");
    assert_eq!(pipeline.stored_fragments(), stored);
}

#[tokio::test]
async fn scores_stay_in_range_under_feedback_storms() {
    let pipeline = ExtractionPipeline::with_defaults();
    pipeline.ingest_text(PASTE).await.expect("ingest");
    let id = pipeline.export(&ExportFilter::default())[0].id;

    let mut last = 0;
    for _ in 0..30 {
        let outcome = pipeline
            .apply_feedback(FeedbackRequest::Accept { fragment_id: id })
            .expect("accept");
        assert!(outcome.fragment.confidence <= 100);
        last = outcome.fragment.confidence;
    }
    assert_eq!(last, 100, "accept storm should pin the score at the ceiling");

    for _ in 0..30 {
        let outcome = pipeline
            .apply_feedback(FeedbackRequest::Reject { fragment_id: id })
            .expect("reject");
        assert!(outcome.fragment.confidence <= 100);
        last = outcome.fragment.confidence;
    }
    assert_eq!(last, 0, "reject storm should pin the score at the floor");
}

#[tokio::test]
async fn export_returns_byte_identical_content_on_repeat_reads() {
    let pipeline = ExtractionPipeline::with_defaults();
    pipeline.ingest_text(PASTE).await.expect("first doc");
    pipeline
        .ingest_text(TWO_FUNCTIONS)
        .await
        .expect("second doc");

    let first = pipeline.export(&ExportFilter::default());
    let second = pipeline.export(&ExportFilter::default());

    let first_json = serde_json::to_string(&first).expect("serialize");
    let second_json = serde_json::to_string(&second).expect("serialize again");
    assert_eq!(first_json, second_json, "exports must be byte-stable");

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.content.as_bytes(), b.content.as_bytes());
    }
}

#[tokio::test]
async fn reject_lowers_only_the_targeted_fragment() {
    let pipeline = ExtractionPipeline::with_defaults();
    let report = pipeline
        .ingest_text(TWO_FUNCTIONS)
        .await
        .expect("ingest two functions");
    assert_eq!(report.fragments, 2, "both declarations should survive");

    let fragments = pipeline.export(&ExportFilter::default());
    let target = fragments[0].clone();
    let bystander = fragments[1].clone();
    assert_ne!(target.content_hash, bystander.content_hash);

    let outcome = pipeline
        .apply_feedback(FeedbackRequest::Reject {
            fragment_id: target.id,
        })
        .expect("reject");
    assert!(
        outcome.fragment.confidence < target.confidence,
        "reject must strictly lower the target"
    );
    assert_eq!(outcome.fragment.status, FragmentStatus::Rejected);

    let untouched = pipeline.fragment(bystander.id).expect("still stored");
    assert_eq!(untouched.confidence, bystander.confidence);
    assert_eq!(untouched.status, FragmentStatus::Pending);
}

#[tokio::test]
async fn modify_supersedes_the_original_and_revalidates_the_replacement() {
    let pipeline = ExtractionPipeline::with_defaults();
    pipeline.ingest_text(PASTE).await.expect("ingest");
    let original = pipeline.export(&ExportFilter::default())[0].clone();

    let outcome = pipeline
        .apply_feedback(FeedbackRequest::Modify {
            fragment_id: original.id,
            corrected_content: "def f(x):\n    return x + 1\n".to_string(),
            corrected_language: None,
            corrected_block_type: None,
        })
        .expect("modify");

    let replacement = outcome.fragment;
    assert_eq!(replacement.supersedes, Some(original.id));
    assert_eq!(replacement.status, FragmentStatus::Pending);
    assert!(replacement.is_valid(), "corrected code should parse");
    assert_eq!(replacement.content, "def f(x):\n    return x + 1");

    let superseded = pipeline.fragment(original.id).expect("kept in store");
    assert_eq!(superseded.status, FragmentStatus::Superseded);
    assert!(
        superseded.confidence < original.confidence,
        "modify adjustment must lower the original"
    );
    assert_eq!(pipeline.stored_fragments(), 2);
}

#[tokio::test]
async fn feedback_on_an_unknown_fragment_is_an_error() {
    let pipeline = ExtractionPipeline::with_defaults();
    let missing = Uuid::new_v4();
    let err = pipeline
        .apply_feedback(FeedbackRequest::Accept {
            fragment_id: missing,
        })
        .expect_err("unknown ids must not be a silent no-op");
    assert!(matches!(err, EngineError::UnknownFragment(id) if id == missing));
}

#[tokio::test]
async fn uploaded_file_extension_steers_detection() {
    let pipeline = ExtractionPipeline::with_defaults();
    let report = pipeline
        .ingest_file("snippet.py", b"def f():\n    return 1\n")
        .await
        .expect("upload");
    assert_eq!(report.fragments, 1);

    let fragments = pipeline.export(&ExportFilter::default());
    assert_eq!(fragments[0].language, Language::Python);
    assert_eq!(fragments[0].language_confidence, DetectionConfidence::High);
    assert!(
        fragments[0].confidence > 91,
        "the extension vote should raise certainty above a bare paste"
    );
}

#[tokio::test]
async fn identical_snippets_share_feedback_weight() {
    let pipeline = ExtractionPipeline::with_defaults();
    let doc_a = "def shared():\n    return 9\n\nAlpha notes here.\n";
    let doc_b = "Intro words first.\n\ndef shared():\n    return 9\n";
    assert_eq!(
        pipeline.ingest_text(doc_a).await.expect("doc a").fragments,
        1
    );
    assert_eq!(
        pipeline.ingest_text(doc_b).await.expect("doc b").fragments,
        1
    );

    let fragments = pipeline.export(&ExportFilter::default());
    let canonical = fragments
        .iter()
        .find(|f| f.duplicate_of.is_none())
        .expect("first sighting");
    let linked = fragments
        .iter()
        .find(|f| f.duplicate_of.is_some())
        .expect("linked duplicate");
    assert_eq!(linked.duplicate_of, Some(canonical.id));
    assert_eq!(linked.content_hash, canonical.content_hash);

    let before = linked.confidence;
    pipeline
        .apply_feedback(FeedbackRequest::Accept {
            fragment_id: canonical.id,
        })
        .expect("accept the canonical copy");

    let linked_after = pipeline.fragment(linked.id).expect("still stored");
    assert_eq!(
        linked_after.confidence,
        before + 4,
        "identical content elsewhere shares the accept"
    );
    assert_eq!(
        linked_after.status,
        FragmentStatus::Pending,
        "status stays with the fragment the event targeted"
    );
}

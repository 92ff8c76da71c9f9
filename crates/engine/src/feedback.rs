//! Usage feedback, aggregated by content hash
//!
//! Feedback is keyed to fragment *content*, not fragment identity: the same
//! snippet pasted twice yields two fragments that share a hash, and an
//! accept on either strengthens both. The raw events are kept alongside the
//! running totals so a log replay can rebuild the tallies exactly.

use crate::score::FeedbackTotals;
use codesift_language::Language;
use codesift_segmenter::BlockType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackAction {
    Accept,
    Reject,
    Modify,
}

impl FeedbackAction {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackAction::Accept => "accept",
            FeedbackAction::Reject => "reject",
            FeedbackAction::Modify => "modify",
        }
    }
}

/// One recorded feedback event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub id: Uuid,
    pub fragment_id: Uuid,
    pub content_hash: String,
    pub action: FeedbackAction,
    /// Language override supplied with a modify
    pub corrected_language: Option<Language>,
    /// Block-type override supplied with a modify
    pub corrected_block_type: Option<BlockType>,
    pub created_at: SystemTime,
}

impl FeedbackEvent {
    pub fn new(fragment_id: Uuid, content_hash: String, action: FeedbackAction) -> Self {
        FeedbackEvent {
            id: Uuid::new_v4(),
            fragment_id,
            content_hash,
            action,
            corrected_language: None,
            corrected_block_type: None,
            created_at: SystemTime::now(),
        }
    }
}

/// Append-only feedback log with per-hash running totals
#[derive(Debug, Default)]
pub struct FeedbackLog {
    by_hash: HashMap<String, FeedbackTotals>,
    events: Vec<FeedbackEvent>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        FeedbackLog::default()
    }

    /// Append an event and fold it into the totals for its hash
    pub fn record(&mut self, event: FeedbackEvent) {
        let totals = self.by_hash.entry(event.content_hash.clone()).or_default();
        match event.action {
            FeedbackAction::Accept => totals.accepts += 1,
            FeedbackAction::Reject => totals.rejects += 1,
            FeedbackAction::Modify => totals.modifies += 1,
        }
        self.events.push(event);
    }

    /// Totals for a content hash; zeroes when nothing was recorded
    pub fn totals_for(&self, content_hash: &str) -> FeedbackTotals {
        self.by_hash.get(content_hash).copied().unwrap_or_default()
    }

    pub fn events(&self) -> &[FeedbackEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

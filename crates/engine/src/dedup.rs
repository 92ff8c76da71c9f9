//! Content-hash deduplication at document and fragment level
//!
//! Documents dedupe hard: re-ingesting bytes already seen records a
//! sighting (origin and time) on the original record and produces no
//! second fragment set. Fragments dedupe soft: a fragment whose content
//! hash was already extracted elsewhere is still stored, but linked to
//! the first sighting so exports and feedback can fold the copies
//! together.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::SystemTime;
use uuid::Uuid;

/// One observed arrival of a document body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sighting {
    pub document_id: Uuid,
    pub origin: String,
    pub seen_at: SystemTime,
}

/// Ledger entry for one distinct document body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document_id: Uuid,
    pub fragment_ids: Vec<Uuid>,
    /// Every arrival of this exact content, the first included
    pub sightings: Vec<Sighting>,
}

#[derive(Debug, Default)]
pub struct Deduplicator {
    documents: HashMap<String, DocumentRecord>,
    fragments: HashMap<String, Uuid>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Deduplicator::default()
    }

    /// Register a document body by hash
    ///
    /// Returns the original record when the hash was seen before, after
    /// appending a sighting with the new arrival's origin; the caller
    /// should skip extraction in that case. A fresh hash is recorded and
    /// `None` comes back.
    pub fn record_document(
        &mut self,
        content_hash: &str,
        document_id: Uuid,
        origin: &str,
    ) -> Option<&DocumentRecord> {
        let sighting = Sighting {
            document_id,
            origin: origin.to_string(),
            seen_at: SystemTime::now(),
        };
        match self.documents.entry(content_hash.to_string()) {
            Entry::Occupied(entry) => {
                let record = entry.into_mut();
                record.sightings.push(sighting);
                Some(record)
            }
            Entry::Vacant(entry) => {
                entry.insert(DocumentRecord {
                    document_id,
                    fragment_ids: Vec::new(),
                    sightings: vec![sighting],
                });
                None
            }
        }
    }

    /// Attach the fragments extracted from a first-sighting document
    pub fn attach_fragments(&mut self, content_hash: &str, fragment_ids: Vec<Uuid>) {
        if let Some(record) = self.documents.get_mut(content_hash) {
            record.fragment_ids = fragment_ids;
        }
    }

    /// Link a fragment by content hash
    ///
    /// The first fragment seen with a hash becomes the canonical one and
    /// `None` is returned; later fragments get `Some(canonical_id)` back,
    /// which the caller stores as `duplicate_of`.
    pub fn link_fragment(&mut self, content_hash: &str, fragment_id: Uuid) -> Option<Uuid> {
        match self.fragments.get(content_hash) {
            Some(first) => Some(*first),
            None => {
                self.fragments.insert(content_hash.to_string(), fragment_id);
                None
            }
        }
    }

    pub fn distinct_documents(&self) -> usize {
        self.documents.len()
    }

    /// Sightings beyond the first, summed over all documents
    pub fn duplicate_sightings(&self) -> u64 {
        self.documents
            .values()
            .map(|record| record.sightings.len().saturating_sub(1) as u64)
            .sum()
    }
}

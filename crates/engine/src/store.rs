//! In-memory fragment store
//!
//! A process-lifetime store behind a `std::sync::RwLock`. Lock poisoning
//! is deliberately shrugged off with `into_inner`: a panicked writer can
//! leave nothing half-written here because every mutation is a single
//! map operation.

use crate::error::{EngineError, Result};
use crate::fragment::{FragmentStatus, ValidatedFragment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// Selection criteria for [`FragmentStore::export`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportFilter {
    /// Keep only these statuses; `None` keeps every status
    pub statuses: Option<Vec<FragmentStatus>>,
    /// Keep only fragments at or above this confidence
    pub min_confidence: Option<u8>,
}

impl ExportFilter {
    fn admits(&self, fragment: &ValidatedFragment) -> bool {
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&fragment.status) {
                return false;
            }
        }
        if let Some(floor) = self.min_confidence {
            if fragment.confidence < floor {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct FragmentStore {
    fragments: RwLock<HashMap<Uuid, ValidatedFragment>>,
}

impl FragmentStore {
    pub fn new() -> Self {
        FragmentStore::default()
    }

    pub fn insert(&self, fragment: ValidatedFragment) {
        let mut fragments = self
            .fragments
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        fragments.insert(fragment.id, fragment);
    }

    pub fn get(&self, id: Uuid) -> Option<ValidatedFragment> {
        let fragments = self
            .fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        fragments.get(&id).cloned()
    }

    /// Apply a mutation to one fragment, returning the updated copy
    pub fn update<F>(&self, id: Uuid, mutate: F) -> Result<ValidatedFragment>
    where
        F: FnOnce(&mut ValidatedFragment),
    {
        let mut fragments = self
            .fragments
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let fragment = fragments.get_mut(&id).ok_or(EngineError::UnknownFragment(id))?;
        mutate(fragment);
        Ok(fragment.clone())
    }

    /// Ids of every fragment sharing a content hash
    pub fn ids_for_hash(&self, content_hash: &str) -> Vec<Uuid> {
        let fragments = self
            .fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        fragments
            .values()
            .filter(|fragment| fragment.content_hash == content_hash)
            .map(|fragment| fragment.id)
            .collect()
    }

    /// Fragments for one document, in line order
    pub fn for_document(&self, document_id: Uuid) -> Vec<ValidatedFragment> {
        let fragments = self
            .fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<ValidatedFragment> = fragments
            .values()
            .filter(|fragment| fragment.document_id == document_id)
            .cloned()
            .collect();
        out.sort_by_key(|fragment| (fragment.start_line, fragment.id));
        out
    }

    /// Filtered snapshot in a byte-stable order
    ///
    /// Sorted by document, then line, then id, so two exports of the same
    /// store serialize identically.
    pub fn export(&self, filter: &ExportFilter) -> Vec<ValidatedFragment> {
        let fragments = self
            .fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<ValidatedFragment> = fragments
            .values()
            .filter(|fragment| filter.admits(fragment))
            .cloned()
            .collect();
        out.sort_by_key(|fragment| (fragment.document_id, fragment.start_line, fragment.id));
        out
    }

    pub fn len(&self) -> usize {
        self.fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

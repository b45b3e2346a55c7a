//! Schemaless documents and the outcome of write operations against them.

use serde::{Deserialize, Serialize};

use crate::id::DocumentId;

/// A schemaless stored document, as submitted by clients and returned to them.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Result of inserting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: DocumentId,
}

impl InsertOutcome {
    pub fn new(inserted_id: DocumentId) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// Result of deleting at most one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteOutcome {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Result of updating at most one document.
///
/// `modified_count` is zero when the filter matched nothing *or* when the
/// matched document already held the requested values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<DocumentId>,
    pub upserted_count: u64,
}

impl UpdateOutcome {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        }
    }

    /// Outcome for a filter that could not match anything.
    pub fn unmatched() -> Self {
        Self::new(0, 0)
    }
}

//! Strongly-typed identifiers for stored documents.

use core::str::FromStr;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a stored document (parcel, payment, user, rider).
///
/// Wraps a document-store object id; over HTTP it travels as the 24-digit
/// lowercase hex rendering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(ObjectId);

impl DocumentId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    pub fn as_object_id(&self) -> &ObjectId {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for DocumentId {
    fn from(value: ObjectId) -> Self {
        Self(value)
    }
}

impl From<DocumentId> for ObjectId {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

impl core::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl FromStr for DocumentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("DocumentId: {e}")))
    }
}

impl TryFrom<String> for DocumentId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.to_hex()
    }
}

//! Typed views over the few document fields the system itself reads or writes.
//!
//! Everything else in a parcel, user or rider document is caller-supplied and
//! passed through untouched.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;

/// Values of the free-text `payment_status` field on parcels.
pub mod payment_status {
    pub const PAID: &str = "paid";
}

/// Narrowing applied when listing parcels. Empty filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ParcelFilter {
    /// Owner email, matched against `created_by`.
    pub created_by: Option<String>,
    pub payment_status: Option<String>,
    pub delivery_status: Option<String>,
}

impl ParcelFilter {
    /// `(field, value)` pairs that must all match.
    pub fn clauses(&self) -> Vec<(&'static str, &str)> {
        [
            ("created_by", self.created_by.as_deref()),
            ("payment_status", self.payment_status.as_deref()),
            ("delivery_status", self.delivery_status.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses()
            .into_iter()
            .all(|(field, value)| doc.get(field).and_then(Value::as_str) == Some(value))
    }
}

/// Body of a payment-recording request.
///
/// `parcel_id` is a plain string reference; nothing checks that it names an
/// existing parcel beyond the status update that precedes the insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub parcel_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// A payment as persisted: the request fields plus the time it was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub parcel_id: String,
    pub email: Option<String>,
    pub amount: Value,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub paid_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(payment: NewPayment, paid_at: DateTime<Utc>) -> Self {
        Self {
            parcel_id: payment.parcel_id,
            email: payment.email,
            amount: payment.amount,
            payment_method: payment.payment_method,
            transaction_id: payment.transaction_id,
            paid_at,
        }
    }

    /// ISO-8601 rendering with millisecond precision and a `Z` suffix.
    pub fn paid_at_string(&self) -> String {
        self.paid_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Fields shared by every storage representation, minus `paid_at`
    /// (whose native type depends on the store).
    pub fn base_fields(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("parcelId".into(), Value::String(self.parcel_id.clone()));
        doc.insert("email".into(), opt_string(&self.email));
        doc.insert("amount".into(), self.amount.clone());
        doc.insert("paymentMethod".into(), opt_string(&self.payment_method));
        doc.insert("transactionId".into(), opt_string(&self.transaction_id));
        doc.insert("paid_at_string".into(), Value::String(self.paid_at_string()));
        doc
    }

    /// Schemaless rendering with `paid_at` as an ISO string.
    pub fn to_document(&self) -> Document {
        let mut doc = self.base_fields();
        doc.insert("paid_at".into(), Value::String(self.paid_at_string()));
        doc
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

/// Free-text rider lifecycle state ("pending", "active", or anything an
/// administrator chooses to set).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiderStatus(String);

impl RiderStatus {
    pub const PENDING: &'static str = "pending";
    pub const ACTIVE: &'static str = "active";

    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn pending() -> Self {
        Self::new(Self::PENDING)
    }

    pub fn active() -> Self {
        Self::new(Self::ACTIVE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive match on "active".
    pub fn is_active(&self) -> bool {
        self.0 == Self::ACTIVE
    }
}

impl core::fmt::Display for RiderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

//! `parcelhub-core`: domain vocabulary shared by every layer.
//!
//! This crate contains **pure domain** types (no IO, no HTTP, no driver types).

pub mod document;
pub mod error;
pub mod id;
pub mod records;

pub use document::{DeleteOutcome, Document, InsertOutcome, UpdateOutcome};
pub use error::DomainError;
pub use id::DocumentId;
pub use records::{NewPayment, ParcelFilter, PaymentRecord, RiderStatus, payment_status};

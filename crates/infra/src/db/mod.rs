//! Persistence gateway: one repository contract per collection.
//!
//! Two implementations share these contracts:
//! - `MongoStore`: the document database used in production
//! - `InMemoryStore`: process-local storage for tests and local development
//!
//! Operations map one-to-one onto single store calls. Nothing here spans two
//! writes; callers that need two writes issue them separately.

use async_trait::async_trait;
use thiserror::Error;

use parcelhub_core::{
    DeleteOutcome, Document, DocumentId, InsertOutcome, ParcelFilter, PaymentRecord, RiderStatus,
    UpdateOutcome,
};

pub mod convert;
pub mod in_memory;
pub mod mongo;

pub use in_memory::InMemoryStore;
pub use mongo::MongoStore;

pub const PARCELS: &str = "parcels";
pub const PAYMENTS: &str = "payments";
pub const USERS: &str = "users";
pub const RIDERS: &str = "riders";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("document encoding failed: {0}")]
    Encoding(#[from] bson::ser::Error),

    #[error("in-memory store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ParcelRepository: Send + Sync {
    /// Parcels matching `filter`, newest `createdAt` first.
    async fn list_parcels(&self, filter: &ParcelFilter) -> StoreResult<Vec<Document>>;

    async fn get_parcel(&self, id: &DocumentId) -> StoreResult<Option<Document>>;

    /// Store the caller's document as-is under a freshly generated id.
    async fn insert_parcel(&self, parcel: Document) -> StoreResult<InsertOutcome>;

    async fn delete_parcel(&self, id: &DocumentId) -> StoreResult<DeleteOutcome>;

    /// Set `payment_status` to paid. Only matches parcels not already paid,
    /// so a repeat call reports zero modifications.
    async fn mark_parcel_paid(&self, id: &DocumentId) -> StoreResult<UpdateOutcome>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Payments for `email` (or all payments), newest `paid_at` first.
    async fn list_payments(&self, email: Option<&str>) -> StoreResult<Vec<Document>>;

    async fn insert_payment(&self, payment: &PaymentRecord) -> StoreResult<InsertOutcome>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Document>>;

    async fn insert_user(&self, user: Document) -> StoreResult<InsertOutcome>;

    /// Overwrite `role` on the first user with this email.
    async fn set_user_role(&self, email: &str, role: &str) -> StoreResult<UpdateOutcome>;
}

#[async_trait]
pub trait RiderRepository: Send + Sync {
    async fn insert_rider(&self, rider: Document) -> StoreResult<InsertOutcome>;

    /// Riders whose `status` equals `status` exactly.
    async fn list_riders_by_status(&self, status: &RiderStatus) -> StoreResult<Vec<Document>>;

    async fn update_rider_status(
        &self,
        id: &DocumentId,
        status: &RiderStatus,
    ) -> StoreResult<UpdateOutcome>;
}

/// The full persistence gateway: all four collections behind one handle.
#[async_trait]
pub trait Store: ParcelRepository + PaymentRepository + UserRepository + RiderRepository {
    /// Round-trip to the backend to confirm it is reachable.
    async fn ping(&self) -> StoreResult<()>;
}

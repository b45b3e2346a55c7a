use std::cmp::Ordering;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use parcelhub_core::{
    DeleteOutcome, Document, DocumentId, InsertOutcome, ParcelFilter, PaymentRecord, RiderStatus,
    UpdateOutcome, payment_status,
};

use super::{
    ParcelRepository, PaymentRepository, RiderRepository, Store, StoreError, StoreResult,
    UserRepository,
};

#[derive(Debug, Default)]
struct Collections {
    parcels: Vec<Document>,
    payments: Vec<Document>,
    users: Vec<Document>,
    riders: Vec<Document>,
}

/// In-memory document store for tests/dev.
///
/// Honours the same contracts as the database-backed store (generated ids,
/// exact-match filters, descending sorts) but keeps nothing across restarts.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> StoreResult<T> {
        let guard = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Collections) -> T) -> StoreResult<T> {
        let mut guard = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut guard))
    }
}

fn insert_with_id(collection: &mut Vec<Document>, mut doc: Document) -> InsertOutcome {
    let id = DocumentId::new();
    doc.insert("_id".into(), Value::String(id.to_hex()));
    collection.push(doc);
    InsertOutcome::new(id)
}

fn has_id(doc: &Document, id: &DocumentId) -> bool {
    doc.get("_id")
        .and_then(Value::as_str)
        .and_then(|stored| stored.parse::<DocumentId>().ok())
        .is_some_and(|stored| stored == *id)
}

fn field_eq(doc: &Document, field: &str, value: &str) -> bool {
    doc.get(field).and_then(Value::as_str) == Some(value)
}

/// Set `field` on the first document accepted by `filter`.
fn set_first(
    collection: &mut [Document],
    filter: impl Fn(&Document) -> bool,
    field: &str,
    value: &str,
) -> UpdateOutcome {
    let Some(doc) = collection.iter_mut().find(|d| filter(d)) else {
        return UpdateOutcome::unmatched();
    };
    if field_eq(doc, field, value) {
        return UpdateOutcome::new(1, 0);
    }
    doc.insert(field.to_string(), Value::String(value.to_string()));
    UpdateOutcome::new(1, 1)
}

/// Type rank mirroring the document store's comparison order for the JSON
/// subset we hold: missing/null < numbers < strings < objects < arrays < bools.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_field(a: &Document, b: &Document, key: &str) -> Ordering {
    let (va, vb) = (a.get(key), b.get(key));
    match (va, vb) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(va).cmp(&type_rank(vb)),
    }
}

fn sorted_desc(mut docs: Vec<Document>, key: &str) -> Vec<Document> {
    docs.sort_by(|a, b| compare_field(b, a, key));
    docs
}

#[async_trait]
impl ParcelRepository for InMemoryStore {
    async fn list_parcels(&self, filter: &ParcelFilter) -> StoreResult<Vec<Document>> {
        let matching = self.read(|c| {
            c.parcels
                .iter()
                .filter(|d| filter.matches(d))
                .cloned()
                .collect()
        })?;
        Ok(sorted_desc(matching, "createdAt"))
    }

    async fn get_parcel(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        self.read(|c| c.parcels.iter().find(|d| has_id(d, id)).cloned())
    }

    async fn insert_parcel(&self, mut parcel: Document) -> StoreResult<InsertOutcome> {
        parcel.remove("_id");
        self.write(|c| insert_with_id(&mut c.parcels, parcel))
    }

    async fn delete_parcel(&self, id: &DocumentId) -> StoreResult<DeleteOutcome> {
        self.write(|c| {
            let position = c.parcels.iter().position(|d| has_id(d, id));
            match position {
                Some(idx) => {
                    c.parcels.remove(idx);
                    DeleteOutcome::new(1)
                }
                None => DeleteOutcome::new(0),
            }
        })
    }

    async fn mark_parcel_paid(&self, id: &DocumentId) -> StoreResult<UpdateOutcome> {
        self.write(|c| {
            set_first(
                &mut c.parcels,
                |d| has_id(d, id) && !field_eq(d, "payment_status", payment_status::PAID),
                "payment_status",
                payment_status::PAID,
            )
        })
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn list_payments(&self, email: Option<&str>) -> StoreResult<Vec<Document>> {
        let matching = self.read(|c| {
            c.payments
                .iter()
                .filter(|d| email.is_none_or(|e| field_eq(d, "email", e)))
                .cloned()
                .collect()
        })?;
        Ok(sorted_desc(matching, "paid_at"))
    }

    async fn insert_payment(&self, payment: &PaymentRecord) -> StoreResult<InsertOutcome> {
        let doc = payment.to_document();
        self.write(|c| insert_with_id(&mut c.payments, doc))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Document>> {
        self.read(|c| c.users.iter().find(|d| field_eq(d, "email", email)).cloned())
    }

    async fn insert_user(&self, mut user: Document) -> StoreResult<InsertOutcome> {
        user.remove("_id");
        self.write(|c| insert_with_id(&mut c.users, user))
    }

    async fn set_user_role(&self, email: &str, role: &str) -> StoreResult<UpdateOutcome> {
        self.write(|c| set_first(&mut c.users, |d| field_eq(d, "email", email), "role", role))
    }
}

#[async_trait]
impl RiderRepository for InMemoryStore {
    async fn insert_rider(&self, mut rider: Document) -> StoreResult<InsertOutcome> {
        rider.remove("_id");
        self.write(|c| insert_with_id(&mut c.riders, rider))
    }

    async fn list_riders_by_status(&self, status: &RiderStatus) -> StoreResult<Vec<Document>> {
        self.read(|c| {
            c.riders
                .iter()
                .filter(|d| field_eq(d, "status", status.as_str()))
                .cloned()
                .collect()
        })
    }

    async fn update_rider_status(
        &self,
        id: &DocumentId,
        status: &RiderStatus,
    ) -> StoreResult<UpdateOutcome> {
        self.write(|c| set_first(&mut c.riders, |d| has_id(d, id), "status", status.as_str()))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read(|_| ())
    }
}

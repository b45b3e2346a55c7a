use async_trait::async_trait;
use bson::{Document as BsonDocument, doc};
use futures_util::TryStreamExt;
use mongodb::{
    Client, Collection, Database,
    options::{ClientOptions, FindOptions, ServerApi, ServerApiVersion},
};

use parcelhub_core::{
    DeleteOutcome, Document, DocumentId, InsertOutcome, ParcelFilter, PaymentRecord, RiderStatus,
    UpdateOutcome, payment_status,
};

use super::convert::{to_bson_document, to_json_document};
use super::{
    PARCELS, PAYMENTS, ParcelRepository, PaymentRepository, RIDERS, RiderRepository, Store,
    StoreResult, USERS, UserRepository,
};

/// MongoDB-backed persistence gateway.
///
/// Holds one long-lived client; clones share the same connection pool.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect with the Stable API v1 (strict, deprecation errors on).
    ///
    /// The driver connects lazily; call [`Store::ping`] to confirm reachability.
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );
        let client = Client::with_options(options)?;
        let db = client.database(database);
        Ok(Self { client, db })
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.db.collection(name)
    }

    async fn find_sorted(
        &self,
        collection: &str,
        filter: BsonDocument,
        sort_key: Option<&str>,
    ) -> StoreResult<Vec<Document>> {
        let options = sort_key.map(|key| {
            let mut sort = BsonDocument::new();
            sort.insert(key, -1);
            FindOptions::builder().sort(sort).build()
        });
        let cursor = self.collection(collection).find(filter, options).await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(to_json_document).collect())
    }

    async fn insert(&self, collection: &str, mut doc: BsonDocument) -> StoreResult<InsertOutcome> {
        let id = DocumentId::new();
        doc.insert("_id", *id.as_object_id());
        self.collection(collection).insert_one(doc, None).await?;
        Ok(InsertOutcome::new(id))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: BsonDocument,
        set: BsonDocument,
    ) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection(collection)
            .update_one(filter, doc! { "$set": set }, None)
            .await?;
        Ok(UpdateOutcome::new(result.matched_count, result.modified_count))
    }
}

fn parcel_filter(filter: &ParcelFilter) -> BsonDocument {
    filter
        .clauses()
        .into_iter()
        .map(|(field, value)| (field.to_string(), bson::Bson::String(value.to_string())))
        .collect()
}

#[async_trait]
impl ParcelRepository for MongoStore {
    async fn list_parcels(&self, filter: &ParcelFilter) -> StoreResult<Vec<Document>> {
        self.find_sorted(PARCELS, parcel_filter(filter), Some("createdAt"))
            .await
    }

    async fn get_parcel(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        let found = self
            .collection(PARCELS)
            .find_one(doc! { "_id": *id.as_object_id() }, None)
            .await?;
        Ok(found.map(to_json_document))
    }

    async fn insert_parcel(&self, parcel: Document) -> StoreResult<InsertOutcome> {
        self.insert(PARCELS, to_bson_document(parcel)?).await
    }

    async fn delete_parcel(&self, id: &DocumentId) -> StoreResult<DeleteOutcome> {
        let result = self
            .collection(PARCELS)
            .delete_one(doc! { "_id": *id.as_object_id() }, None)
            .await?;
        Ok(DeleteOutcome::new(result.deleted_count))
    }

    async fn mark_parcel_paid(&self, id: &DocumentId) -> StoreResult<UpdateOutcome> {
        self.update_one(
            PARCELS,
            doc! {
                "_id": *id.as_object_id(),
                "payment_status": { "$ne": payment_status::PAID },
            },
            doc! { "payment_status": payment_status::PAID },
        )
        .await
    }
}

#[async_trait]
impl PaymentRepository for MongoStore {
    async fn list_payments(&self, email: Option<&str>) -> StoreResult<Vec<Document>> {
        let filter = match email {
            Some(email) => doc! { "email": email },
            None => doc! {},
        };
        self.find_sorted(PAYMENTS, filter, Some("paid_at")).await
    }

    async fn insert_payment(&self, payment: &PaymentRecord) -> StoreResult<InsertOutcome> {
        let mut doc = to_bson_document(payment.base_fields())?;
        doc.insert("paid_at", bson::DateTime::from_chrono(payment.paid_at));
        self.insert(PAYMENTS, doc).await
    }
}

#[async_trait]
impl UserRepository for MongoStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Document>> {
        let found = self
            .collection(USERS)
            .find_one(doc! { "email": email }, None)
            .await?;
        Ok(found.map(to_json_document))
    }

    async fn insert_user(&self, user: Document) -> StoreResult<InsertOutcome> {
        self.insert(USERS, to_bson_document(user)?).await
    }

    async fn set_user_role(&self, email: &str, role: &str) -> StoreResult<UpdateOutcome> {
        self.update_one(USERS, doc! { "email": email }, doc! { "role": role })
            .await
    }
}

#[async_trait]
impl RiderRepository for MongoStore {
    async fn insert_rider(&self, rider: Document) -> StoreResult<InsertOutcome> {
        self.insert(RIDERS, to_bson_document(rider)?).await
    }

    async fn list_riders_by_status(&self, status: &RiderStatus) -> StoreResult<Vec<Document>> {
        self.find_sorted(RIDERS, doc! { "status": status.as_str() }, None)
            .await
    }

    async fn update_rider_status(
        &self,
        id: &DocumentId,
        status: &RiderStatus,
    ) -> StoreResult<UpdateOutcome> {
        self.update_one(
            RIDERS,
            doc! { "_id": *id.as_object_id() },
            doc! { "status": status.as_str() },
        )
        .await
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }
}

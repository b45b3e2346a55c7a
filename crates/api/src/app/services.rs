//! Long-lived collaborators shared by every handler.

use std::sync::Arc;

use parcelhub_auth::{
    CredentialError, FirebaseTokenVerifier, Hs256TokenVerifier, ServiceAccount, TokenVerifier,
};
use parcelhub_infra::config::{AppConfig, IdentityConfig, StoreConfig};
use parcelhub_infra::db::{InMemoryStore, MongoStore, Store, StoreError};
use parcelhub_infra::external::{
    PaymentIntentCreator, StripePaymentIntents, UnconfiguredPaymentIntents,
};

#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub payments: Arc<dyn PaymentIntentCreator>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, payments: Arc<dyn PaymentIntentCreator>) -> Self {
        Self { store, payments }
    }

    /// Connect the configured store and confirm it answers a ping.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn Store> = match &config.store {
            StoreConfig::Mongo { uri, database } => {
                Arc::new(MongoStore::connect(uri, database).await?)
            }
            StoreConfig::Memory => Arc::new(InMemoryStore::new()),
        };
        store.ping().await?;
        tracing::info!("pinged deployment; store connection is healthy");

        let payments: Arc<dyn PaymentIntentCreator> = match &config.payment_gateway_key {
            Some(key) => Arc::new(StripePaymentIntents::new(key.clone())),
            None => Arc::new(UnconfiguredPaymentIntents),
        };

        Ok(Self::new(store, payments))
    }
}

pub fn build_verifier(identity: &IdentityConfig) -> Result<Arc<dyn TokenVerifier>, CredentialError> {
    match identity {
        IdentityConfig::Firebase { credentials } => {
            let account = ServiceAccount::from_bundle(credentials)?;
            tracing::info!(project_id = %account.project_id, "verifying identity tokens with provider keys");
            Ok(Arc::new(FirebaseTokenVerifier::new(&account)))
        }
        IdentityConfig::DevSecret(secret) => {
            Ok(Arc::new(Hs256TokenVerifier::new(secret.as_bytes())))
        }
    }
}

//! External service clients: the card-payment gateway.

use async_trait::async_trait;
use thiserror::Error;

pub mod stripe;

pub use stripe::StripePaymentIntents;

/// A payment authorization created at the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    /// Secret the client uses to confirm the payment; relayed as-is.
    pub client_secret: String,
}

/// Gateway failure. `Display` yields the text surfaced to API callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentGatewayError {
    /// The gateway answered with an error; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Transport(String),

    #[error("unexpected payment gateway response: {0}")]
    Decode(String),

    #[error("payment gateway key is not configured")]
    NotConfigured,
}

/// Creates card-only payment authorizations in a single fixed currency.
#[async_trait]
pub trait PaymentIntentCreator: Send + Sync {
    /// `amount_in_cents` is in minor units of the gateway currency.
    async fn create_intent(&self, amount_in_cents: i64) -> Result<PaymentIntent, PaymentGatewayError>;
}

/// Stand-in used when no gateway key is configured: every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredPaymentIntents;

#[async_trait]
impl PaymentIntentCreator for UnconfiguredPaymentIntents {
    async fn create_intent(&self, _amount_in_cents: i64) -> Result<PaymentIntent, PaymentGatewayError> {
        Err(PaymentGatewayError::NotConfigured)
    }
}

//! Stripe payment-intents client.

use async_trait::async_trait;
use serde::Deserialize;

use super::{PaymentGatewayError, PaymentIntent, PaymentIntentCreator};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";
pub const CURRENCY: &str = "usd";

const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripePaymentIntents {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripePaymentIntents {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_api_base(secret_key, DEFAULT_API_BASE)
    }

    /// Point the client at another base URL (a local mock in tests).
    pub fn with_api_base(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/payment_intents", self.api_base)
    }
}

fn body_preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

/// The gateway's own error message, or a preview of whatever it sent.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| format!("payment gateway returned {status}: {}", body_preview(body)))
}

#[async_trait]
impl PaymentIntentCreator for StripePaymentIntents {
    async fn create_intent(&self, amount_in_cents: i64) -> Result<PaymentIntent, PaymentGatewayError> {
        let amount = amount_in_cents.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", CURRENCY),
            ("payment_method_types[]", "card"),
        ];

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|err| PaymentGatewayError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| PaymentGatewayError::Transport(err.to_string()))?;

        if !status.is_success() {
            tracing::warn!(%status, "payment gateway rejected intent");
            return Err(PaymentGatewayError::Rejected(rejection_message(status, &body)));
        }

        let intent: IntentResponse = serde_json::from_str(&body)
            .map_err(|err| PaymentGatewayError::Decode(err.to_string()))?;
        tracing::info!(intent_id = %intent.id, amount_in_cents, "payment intent created");
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use parcelhub_core::{Document, DocumentId, NewPayment, PaymentRecord};

use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::AppServices;
use crate::context::IdentityContext;

const NOT_FOUND_OR_PAID: &str = "Parcel not found or already paid";
const RECORDED: &str = "Payment recorded and parcel marked as paid";

#[derive(Debug, Default, Deserialize)]
pub struct PaymentsQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecorded {
    pub message: &'static str,
    pub inserted_id: DocumentId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    pub amount_in_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentCreated {
    pub client_secret: String,
}

/// Callers may only query their own payments; no (or an empty) `email`
/// lists all of them.
pub async fn list_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<IdentityContext>,
    Query(query): Query<PaymentsQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    // An empty `email` is no filter at all.
    let email = query.email.as_deref().filter(|email| !email.is_empty());
    if let Some(email) = email {
        if identity.email() != Some(email) {
            tracing::warn!(subject = identity.subject(), "payment lookup for another email");
            return Err(ApiError::Forbidden);
        }
    }

    let payments = services
        .store
        .list_payments(email)
        .await
        .map_err(|e| ApiError::internal("Failed to get payments", e))?;
    Ok(Json(payments))
}

/// Mark the parcel paid, then record the payment.
///
/// The two writes are independent: the insert only happens when the update
/// modified a parcel, but nothing undoes the update if the insert fails.
pub async fn record_payment(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewPayment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PaymentRecorded>)> {
    let Json(payment) = body?;
    let Ok(parcel_id) = payment.parcel_id.parse::<DocumentId>() else {
        return Err(ApiError::NotFound(NOT_FOUND_OR_PAID));
    };

    let updated = services
        .store
        .mark_parcel_paid(&parcel_id)
        .await
        .map_err(|e| ApiError::internal("Failed to record payment", e))?;
    if updated.modified_count == 0 {
        return Err(ApiError::NotFound(NOT_FOUND_OR_PAID));
    }

    let record = PaymentRecord::new(payment, Utc::now());
    let inserted = services
        .store
        .insert_payment(&record)
        .await
        .map_err(|e| ApiError::internal("Failed to record payment", e))?;

    tracing::info!(
        parcel_id = %parcel_id,
        payment_id = %inserted.inserted_id,
        "payment recorded"
    );
    Ok((
        StatusCode::CREATED,
        Json(PaymentRecorded {
            message: RECORDED,
            inserted_id: inserted.inserted_id,
        }),
    ))
}

pub async fn create_payment_intent(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<PaymentIntentRequest>, JsonRejection>,
) -> ApiResult<Json<PaymentIntentCreated>> {
    let Json(request) = body?;
    let intent = services.payments.create_intent(request.amount_in_cents).await?;
    Ok(Json(PaymentIntentCreated {
        client_secret: intent.client_secret,
    }))
}

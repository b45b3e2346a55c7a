use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use parcelhub_core::{DeleteOutcome, Document, DocumentId, InsertOutcome, ParcelFilter};

use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::AppServices;

const NOT_FOUND: &str = "Parcel not found";

/// `email` narrows to parcels created by that owner.
#[derive(Debug, Default, Deserialize)]
pub struct ParcelQuery {
    pub email: Option<String>,
    pub payment_status: Option<String>,
    pub delivery_status: Option<String>,
}

impl From<ParcelQuery> for ParcelFilter {
    fn from(query: ParcelQuery) -> Self {
        Self {
            created_by: query.email,
            payment_status: query.payment_status,
            delivery_status: query.delivery_status,
        }
    }
}

pub async fn list_parcels(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ParcelQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = ParcelFilter::from(query);
    let parcels = services
        .store
        .list_parcels(&filter)
        .await
        .map_err(|e| ApiError::internal("Failed to get parcels", e))?;
    Ok(Json(parcels))
}

pub async fn get_parcel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Document>> {
    let Ok(id) = id.parse::<DocumentId>() else {
        return Err(ApiError::NotFound(NOT_FOUND));
    };

    services
        .store
        .get_parcel(&id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch parcel", e))?
        .map(Json)
        .ok_or(ApiError::NotFound(NOT_FOUND))
}

pub async fn create_parcel(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Document>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InsertOutcome>)> {
    let Json(parcel) = body?;
    let outcome = services
        .store
        .insert_parcel(parcel)
        .await
        .map_err(|e| ApiError::internal("Failed to create parcel", e))?;
    tracing::info!(parcel_id = %outcome.inserted_id, "parcel created");
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Unknown or malformed ids delete nothing and report a zero count.
pub async fn delete_parcel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteOutcome>> {
    let Ok(id) = id.parse::<DocumentId>() else {
        return Ok(Json(DeleteOutcome::new(0)));
    };

    let outcome = services
        .store
        .delete_parcel(&id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete parcel", e))?;
    Ok(Json(outcome))
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
};
use serde::Deserialize;

use parcelhub_auth::Role;
use parcelhub_core::{Document, DocumentId, InsertOutcome, RiderStatus, UpdateOutcome};

use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::AppServices;

#[derive(Debug, Deserialize)]
pub struct RiderStatusUpdate {
    pub status: RiderStatus,
    /// Email of the user to promote when the rider becomes active.
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn register_rider(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Document>, JsonRejection>,
) -> ApiResult<Json<InsertOutcome>> {
    let Json(rider) = body?;
    let outcome = services
        .store
        .insert_rider(rider)
        .await
        .map_err(|e| ApiError::internal("Failed to register rider", e))?;
    Ok(Json(outcome))
}

pub async fn pending_riders(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<Document>>> {
    riders_with_status(&services, &RiderStatus::pending()).await
}

pub async fn active_riders(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<Document>>> {
    riders_with_status(&services, &RiderStatus::active()).await
}

async fn riders_with_status(
    services: &AppServices,
    status: &RiderStatus,
) -> ApiResult<Json<Vec<Document>>> {
    let riders = services
        .store
        .list_riders_by_status(status)
        .await
        .map_err(|e| ApiError::internal("Failed to get riders", e))?;
    Ok(Json(riders))
}

/// Set a rider's status. Activation also gives the user with the supplied
/// email the rider role, as a second write independent of the first.
pub async fn update_rider_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<RiderStatusUpdate>, JsonRejection>,
) -> ApiResult<Json<UpdateOutcome>> {
    let Json(update) = body?;
    let Ok(id) = id.parse::<DocumentId>() else {
        return Ok(Json(UpdateOutcome::unmatched()));
    };

    let outcome = services
        .store
        .update_rider_status(&id, &update.status)
        .await
        .map_err(|e| ApiError::internal("Failed to update rider status", e))?;

    if update.status.is_active() {
        if let Some(email) = update.email.as_deref() {
            let role = Role::rider();
            services
                .store
                .set_user_role(email, role.as_str())
                .await
                .map_err(|e| ApiError::internal("Failed to update rider status", e))?;
            tracing::info!(rider_id = %id, %role, "user promoted to rider");
        }
    }

    Ok(Json(outcome))
}

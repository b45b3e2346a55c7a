use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use parcelhub_core::{Document, DomainError};

use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::AppServices;

/// Register a user once per email; repeat registrations are a no-op.
pub async fn register_user(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Document>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(mut user) = body?;
    let email = match user.get("email").and_then(Value::as_str).map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => return Err(DomainError::validation("email is required").into()),
    };
    // Store exactly the key the existence check looks up.
    user.insert("email".into(), Value::String(email.clone()));

    let existing = services
        .store
        .find_user_by_email(&email)
        .await
        .map_err(|e| ApiError::internal("Failed to register user", e))?;
    if existing.is_some() {
        return Ok(Json(json!({ "message": "user already exists", "inserted": false }))
            .into_response());
    }

    let outcome = services
        .store
        .insert_user(user)
        .await
        .map_err(|e| ApiError::internal("Failed to register user", e))?;
    tracing::info!(user_id = %outcome.inserted_id, "user registered");
    Ok(Json(outcome).into_response())
}

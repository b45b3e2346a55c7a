use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use parcelhub_auth::TokenVerifier;

use crate::app::errors::ApiError;
use crate::context::IdentityContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Reject requests without a valid bearer token.
///
/// Missing or malformed header: 401. Token that fails verification: 403.
pub async fn require_auth(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let identity = verify(&state, token).await?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Like [`require_auth`], but a request with no `Authorization` header at
/// all proceeds anonymously.
pub async fn optional_auth(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if req.headers().contains_key(header::AUTHORIZATION) {
        let token = extract_bearer(req.headers())?;
        let identity = verify(&state, token).await?;
        req.extensions_mut().insert(identity);
    }
    Ok(next.run(req).await)
}

async fn verify(state: &AuthState, token: &str) -> Result<IdentityContext, ApiError> {
    let claims = state.verifier.verify(token).await.map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        ApiError::Forbidden
    })?;
    Ok(IdentityContext::new(claims))
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Unauthorized)?;

    let header = header.to_str().map_err(|_| ApiError::Unauthorized)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?
        .trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    Ok(token)
}

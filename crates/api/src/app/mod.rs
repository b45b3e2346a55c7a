//! HTTP application wiring (axum router + shared services).
//!
//! - `services.rs`: store, payment gateway and token verifier construction
//! - `routes/`: handlers, one file per resource
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use parcelhub_auth::TokenVerifier;

use crate::middleware::AuthState;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
pub fn build_app(services: AppServices, verifier: Arc<dyn TokenVerifier>) -> Router {
    let auth = AuthState { verifier };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::router(auth).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(Extension(Arc::new(services))),
    )
}

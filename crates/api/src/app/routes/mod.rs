use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};

use crate::middleware::{AuthState, optional_auth, require_auth};

pub mod parcels;
pub mod payments;
pub mod riders;
pub mod system;
pub mod users;

/// Every endpoint, with authentication attached per method where required.
pub fn router(auth: AuthState) -> Router {
    let optional = || from_fn_with_state(auth.clone(), optional_auth);
    let required = || from_fn_with_state(auth.clone(), require_auth);

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route(
            "/parcels",
            get(parcels::list_parcels)
                .route_layer(optional())
                .merge(post(parcels::create_parcel).route_layer(required())),
        )
        .route(
            "/parcels/:id",
            get(parcels::get_parcel).delete(parcels::delete_parcel),
        )
        .route(
            "/payments",
            get(payments::list_payments)
                .route_layer(required())
                .merge(post(payments::record_payment)),
        )
        .route("/create-payment-intent", post(payments::create_payment_intent))
        .route("/users", post(users::register_user))
        .route("/riders", post(riders::register_rider))
        .route("/riders/pending", get(riders::pending_riders))
        .route("/riders/active", get(riders::active_riders))
        .route("/riders/:id/status", patch(riders::update_rider_status))
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use parcelhub_api::app::{AppServices, build_app};
use parcelhub_auth::{
    FirebaseTokenVerifier, Hs256TokenVerifier, IdentityClaims, ServiceAccount, TokenVerifier,
};
use parcelhub_infra::db::{InMemoryStore, UserRepository};
use parcelhub_infra::external::{PaymentGatewayError, PaymentIntent, PaymentIntentCreator};

const JWT_SECRET: &str = "test-secret";

/// Gateway double: mimics the real minimum-charge rejection.
struct FakeGateway;

#[async_trait]
impl PaymentIntentCreator for FakeGateway {
    async fn create_intent(&self, amount_in_cents: i64) -> Result<PaymentIntent, PaymentGatewayError> {
        if amount_in_cents < 50 {
            return Err(PaymentGatewayError::Rejected(
                "Amount must be at least $0.50 usd".into(),
            ));
        }
        Ok(PaymentIntent {
            id: "pi_test".into(),
            client_secret: format!("pi_test_secret_{amount_in_cents}"),
        })
    }
}

struct TestServer {
    base_url: String,
    store: Arc<InMemoryStore>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_verifier(Arc::new(Hs256TokenVerifier::new(JWT_SECRET))).await
    }

    async fn spawn_with_verifier(verifier: Arc<dyn TokenVerifier>) -> Self {
        // Same router as prod, in-memory store, bound to an ephemeral port.
        let store = Arc::new(InMemoryStore::new());
        let services = AppServices::new(store.clone(), Arc::new(FakeGateway));
        let app = build_app(services, verifier);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn create_parcel(&self, token: &str, body: Value) -> String {
        let res = self.post_json("/parcels", body, Some(token)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: Value = res.json().await.unwrap();
        created["insertedId"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(email: &str) -> String {
    mint_jwt_with(JWT_SECRET, email, ChronoDuration::minutes(10))
}

fn mint_jwt_with(secret: &str, email: &str, ttl: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = IdentityClaims {
        sub: format!("uid-{email}"),
        email: Some(email.to_string()),
        name: None,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn root_and_health_respond() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Parcel server is running 🚀");

    assert_eq!(srv.get("/health").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .get(srv.url("/parcels"))
        .header("Origin", "https://parcel.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn creating_a_parcel_requires_a_valid_token() {
    let srv = TestServer::spawn().await;
    let body = json!({ "title": "Books", "created_by": "a@x.com" });

    let res = srv.post_json("/parcels", body.clone(), None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "unauthorized access");

    let res = srv
        .client
        .post(srv.url("/parcels"))
        .header("Authorization", "Token abc")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt_with("other-secret", "a@x.com", ChronoDuration::minutes(10));
    let res = srv.post_json("/parcels", body.clone(), Some(&forged)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "forbidden access");

    let expired = mint_jwt_with(JWT_SECRET, "a@x.com", ChronoDuration::minutes(-10));
    let res = srv.post_json("/parcels", body, Some(&expired)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn created_parcel_reads_back_with_generated_id() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt("a@x.com");
    let body = json!({
        "_id": "client-chosen",
        "title": "Books",
        "weight": 2.5,
        "created_by": "a@x.com",
        "payment_status": "unpaid",
        "receiver": { "name": "B", "district": "Dhaka" },
        "tags": ["fragile"],
    });

    let id = srv.create_parcel(&token, body.clone()).await;
    assert_eq!(id.len(), 24);

    let res = srv.get(&format!("/parcels/{id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let stored: Value = res.json().await.unwrap();

    let mut expected = body;
    expected["_id"] = json!(id);
    assert_eq!(stored, expected);
}

#[tokio::test]
async fn unknown_parcel_is_not_found() {
    let srv = TestServer::spawn().await;

    for id in ["64b7f0c2a1d3e4f5a6b7c8d9", "not-an-object-id"] {
        let res = srv.get(&format!("/parcels/{id}")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["message"], "Parcel not found");
    }
}

#[tokio::test]
async fn deleting_reports_the_removed_count() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt("a@x.com");
    let id = srv.create_parcel(&token, json!({ "title": "Lamp" })).await;

    for (target, expected) in [
        ("64b7f0c2a1d3e4f5a6b7c8d9", 0),
        ("garbage", 0),
        (id.as_str(), 1),
        (id.as_str(), 0),
    ] {
        let res = srv
            .client
            .delete(srv.url(&format!("/parcels/{target}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let outcome: Value = res.json().await.unwrap();
        assert_eq!(outcome, json!({ "acknowledged": true, "deletedCount": expected }));
    }

    assert_eq!(srv.get(&format!("/parcels/{id}")).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn parcel_listing_filters_by_owner_and_sorts_newest_first() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt("a@x.com");

    srv.create_parcel(&token, json!({ "title": "old", "created_by": "a@x.com", "createdAt": "2025-01-01T00:00:00.000Z" })).await;
    srv.create_parcel(&token, json!({ "title": "new", "created_by": "a@x.com", "createdAt": "2025-03-01T00:00:00.000Z" })).await;
    srv.create_parcel(&token, json!({ "title": "theirs", "created_by": "b@x.com", "createdAt": "2025-02-01T00:00:00.000Z", "payment_status": "paid" })).await;

    // Anonymous listing is allowed.
    let all: Value = srv.get("/parcels").await.json().await.unwrap();
    let titles: Vec<&str> = all.as_array().unwrap().iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["new", "theirs", "old"]);

    let mine: Value = srv.get("/parcels?email=a@x.com").await.json().await.unwrap();
    let titles: Vec<&str> = mine.as_array().unwrap().iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["new", "old"]);

    let paid: Value = srv.get("/parcels?payment_status=paid").await.json().await.unwrap();
    assert_eq!(paid.as_array().unwrap().len(), 1);
    assert_eq!(paid[0]["title"], "theirs");

    // A token that is present is still verified.
    let res = srv
        .client
        .get(srv.url("/parcels"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv.client.get(srv.url("/parcels")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn registering_the_same_email_twice_inserts_once() {
    let srv = TestServer::spawn().await;

    let res = srv.post_json("/users", json!({ "email": "a@x.com", "role": "user" }), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let first: Value = res.json().await.unwrap();
    assert_eq!(first["acknowledged"], true);
    assert!(first["insertedId"].is_string());

    let res = srv.post_json("/users", json!({ "email": "a@x.com", "name": "Again" }), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let second: Value = res.json().await.unwrap();
    assert_eq!(second, json!({ "message": "user already exists", "inserted": false }));

    let user = srv.store.find_user_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(user.get("role"), Some(&json!("user")));
    assert!(user.get("name").is_none());

    let res = srv.post_json("/users", json!({ "name": "No email" }), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn padded_email_is_stored_trimmed_and_registered_once() {
    let srv = TestServer::spawn().await;

    let res = srv.post_json("/users", json!({ "email": " a@x.com " }), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let first: Value = res.json().await.unwrap();
    assert!(first["insertedId"].is_string());

    for email in [" a@x.com ", " a@x.com", "a@x.com"] {
        let res = srv.post_json("/users", json!({ "email": email }), None).await;
        let again: Value = res.json().await.unwrap();
        assert_eq!(again, json!({ "message": "user already exists", "inserted": false }));
    }

    let user = srv.store.find_user_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(user.get("email"), Some(&json!("a@x.com")));
}

#[tokio::test]
async fn paying_for_an_unknown_parcel_records_nothing() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt("a@x.com");

    for parcel_id in ["64b7f0c2a1d3e4f5a6b7c8d9", "bogus"] {
        let res = srv
            .post_json(
                "/payments",
                json!({ "parcelId": parcel_id, "email": "a@x.com", "amount": 500 }),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["message"], "Parcel not found or already paid");
    }

    let res = srv.client.get(srv.url("/payments")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let payments: Value = res.json().await.unwrap();
    assert_eq!(payments, json!([]));
}

#[tokio::test]
async fn paying_marks_parcel_paid_and_records_one_payment() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt("a@x.com");
    let id = srv
        .create_parcel(&token, json!({ "created_by": "a@x.com", "payment_status": "unpaid" }))
        .await;

    let payment = json!({
        "parcelId": id,
        "email": "a@x.com",
        "amount": 500,
        "paymentMethod": "card",
        "transactionId": "pi_123",
    });
    let res = srv.post_json("/payments", payment.clone(), None).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let recorded: Value = res.json().await.unwrap();
    assert_eq!(recorded["message"], "Payment recorded and parcel marked as paid");
    let payment_id = recorded["insertedId"].as_str().unwrap().to_string();

    let parcel: Value = srv.get(&format!("/parcels/{id}")).await.json().await.unwrap();
    assert_eq!(parcel["payment_status"], "paid");

    // Already paid: rejected, no second record.
    let res = srv.post_json("/payments", payment, None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .get(srv.url("/payments?email=a@x.com"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let payments: Value = res.json().await.unwrap();
    let payments = payments.as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["_id"], json!(payment_id));
    assert_eq!(payments[0]["parcelId"], json!(id));
    assert_eq!(payments[0]["amount"], 500);
    assert_eq!(payments[0]["transactionId"], "pi_123");
    assert_eq!(payments[0]["paid_at"], payments[0]["paid_at_string"]);
}

#[tokio::test]
async fn payment_history_is_private_to_its_owner() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/payments?email=a@x.com").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let intruder = mint_jwt("b@x.com");
    let res = srv
        .client
        .get(srv.url("/payments?email=a@x.com"))
        .bearer_auth(&intruder)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "forbidden access");
    assert!(err.get("data").is_none());
}

#[tokio::test]
async fn empty_email_filter_lists_every_payment() {
    let srv = TestServer::spawn().await;
    let owner = mint_jwt("a@x.com");
    let id = srv
        .create_parcel(&owner, json!({ "created_by": "a@x.com", "payment_status": "unpaid" }))
        .await;
    let res = srv
        .post_json("/payments", json!({ "parcelId": id, "email": "a@x.com", "amount": 500 }), None)
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let other = mint_jwt("b@x.com");
    let res = srv
        .client
        .get(srv.url("/payments?email="))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let payments: Value = res.json().await.unwrap();
    assert_eq!(payments.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn payment_intent_relays_client_secret_or_gateway_error() {
    let srv = TestServer::spawn().await;

    let res = srv.post_json("/create-payment-intent", json!({ "amountInCents": 1500 }), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "clientSecret": "pi_test_secret_1500" }));

    let res = srv.post_json("/create-payment-intent", json!({ "amountInCents": 10 }), None).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "Amount must be at least $0.50 usd");

    let res = srv.post_json("/create-payment-intent", json!({ "amount": "lots" }), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rider_lists_only_show_exact_status() {
    let srv = TestServer::spawn().await;

    for (name, status) in [("p1", "pending"), ("a1", "active"), ("x1", "Pending"), ("d1", "deactivated"), ("p2", "pending")] {
        let res = srv.post_json("/riders", json!({ "name": name, "status": status }), None).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let pending: Value = srv.get("/riders/pending").await.json().await.unwrap();
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|r| r["status"] == "pending"));

    let active: Value = srv.get("/riders/active").await.json().await.unwrap();
    let active = active.as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["name"], "a1");
}

#[tokio::test]
async fn activating_a_rider_promotes_the_user() {
    let srv = TestServer::spawn().await;
    srv.post_json("/users", json!({ "email": "r@x.com", "role": "user" }), None).await;
    srv.post_json("/users", json!({ "email": "s@x.com", "role": "user" }), None).await;

    let res = srv
        .post_json("/riders", json!({ "email": "r@x.com", "status": "pending" }), None)
        .await;
    let rider: Value = res.json().await.unwrap();
    let rider_id = rider["insertedId"].as_str().unwrap().to_string();

    let res = srv
        .client
        .patch(srv.url(&format!("/riders/{rider_id}/status")))
        .json(&json!({ "status": "active", "email": "r@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome["matchedCount"], 1);
    assert_eq!(outcome["modifiedCount"], 1);

    let user = srv.store.find_user_by_email("r@x.com").await.unwrap().unwrap();
    assert_eq!(user.get("role"), Some(&json!("rider")));

    let active: Value = srv.get("/riders/active").await.json().await.unwrap();
    assert_eq!(active.as_array().unwrap().len(), 1);

    // Any other status leaves the user's role alone.
    let res = srv
        .post_json("/riders", json!({ "email": "s@x.com", "status": "pending" }), None)
        .await;
    let rider: Value = res.json().await.unwrap();
    let other_id = rider["insertedId"].as_str().unwrap().to_string();

    let res = srv
        .client
        .patch(srv.url(&format!("/riders/{other_id}/status")))
        .json(&json!({ "status": "rejected", "email": "s@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let user = srv.store.find_user_by_email("s@x.com").await.unwrap().unwrap();
    assert_eq!(user.get("role"), Some(&json!("user")));

    let res = srv
        .client
        .patch(srv.url("/riders/nope/status"))
        .json(&json!({ "status": "active", "email": "s@x.com" }))
        .send()
        .await
        .unwrap();
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome["modifiedCount"], 0);
    let user = srv.store.find_user_by_email("s@x.com").await.unwrap().unwrap();
    assert_eq!(user.get("role"), Some(&json!("user")));
}

#[tokio::test]
async fn end_to_end_register_book_and_pay() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt("a@x.com");

    let res = srv.post_json("/users", json!({ "email": "a@x.com" }), None).await;
    assert!(res.status() == StatusCode::OK || res.status() == StatusCode::CREATED);
    let res = srv.post_json("/users", json!({ "email": "a@x.com" }), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let again: Value = res.json().await.unwrap();
    assert_eq!(again["inserted"], false);

    let id = srv
        .create_parcel(&token, json!({ "created_by": "a@x.com", "payment_status": "unpaid" }))
        .await;
    let res = srv
        .post_json(
            "/payments",
            json!({ "parcelId": id, "email": "a@x.com", "amount": 500, "paymentMethod": "card", "transactionId": "pi_1" }),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let parcel: Value = srv.get(&format!("/parcels/{id}")).await.json().await.unwrap();
    assert_eq!(parcel["payment_status"], "paid");
}

#[tokio::test]
async fn unreachable_identity_provider_is_forbidden() {
    let account = ServiceAccount::from_bundle(r#"{"project_id": "parcel-app-1234"}"#).unwrap();
    let verifier = FirebaseTokenVerifier::with_jwks_url(&account, "http://127.0.0.1:1/keys");
    let srv = TestServer::spawn_with_verifier(Arc::new(verifier)).await;

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some("signing-key-1".into());
    let token = jsonwebtoken::encode(
        &header,
        &json!({ "sub": "uid-1", "email": "a@x.com", "exp": Utc::now().timestamp() + 600 }),
        &EncodingKey::from_secret(b"irrelevant"),
    )
    .unwrap();

    let res = srv.post_json("/parcels", json!({ "title": "Books" }), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "forbidden access");
}

//! Remote identity-provider verification (Firebase ID tokens).
//!
//! Tokens are RS256-signed by the provider; the public keys are published as a
//! JWK set and fetched on every verification (there is no key cache).

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, jwk::JwkSet};
use serde::Deserialize;
use thiserror::Error;

use crate::claims::{IdentityClaims, TokenVerificationError};
use crate::verifier::TokenVerifier;

pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Service credential bundle of the identity provider.
///
/// Only `project_id` is needed to verify tokens; the rest is kept for logs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential bundle is neither JSON nor base64-encoded JSON")]
    Encoding,

    #[error("credential bundle is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("credential bundle has an empty project_id")]
    MissingProject,
}

impl ServiceAccount {
    /// Parse a bundle given either as raw JSON or as base64-encoded JSON.
    pub fn from_bundle(raw: &str) -> Result<Self, CredentialError> {
        let raw = raw.trim();
        let json = if raw.starts_with('{') {
            raw.to_string()
        } else {
            let bytes = general_purpose::STANDARD
                .decode(raw)
                .map_err(|_| CredentialError::Encoding)?;
            String::from_utf8(bytes).map_err(|_| CredentialError::Encoding)?
        };

        let account: ServiceAccount = serde_json::from_str(&json)?;
        if account.project_id.trim().is_empty() {
            return Err(CredentialError::MissingProject);
        }
        Ok(account)
    }
}

/// Verifies provider-issued ID tokens against the published signing keys.
pub struct FirebaseTokenVerifier {
    client: reqwest::Client,
    jwks_url: String,
    project_id: String,
}

impl FirebaseTokenVerifier {
    pub fn new(account: &ServiceAccount) -> Self {
        Self::with_jwks_url(account, DEFAULT_JWKS_URL)
    }

    pub fn with_jwks_url(account: &ServiceAccount, jwks_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            jwks_url: jwks_url.into(),
            project_id: account.project_id.clone(),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("{ISSUER_PREFIX}{}", self.project_id)]);
        validation
    }

    async fn fetch_keys(&self) -> Result<JwkSet, TokenVerificationError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(provider_error)?
            .error_for_status()
            .map_err(provider_error)?;
        response.json::<JwkSet>().await.map_err(provider_error)
    }
}

fn provider_error(err: reqwest::Error) -> TokenVerificationError {
    TokenVerificationError::Provider(err.to_string())
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<IdentityClaims, TokenVerificationError> {
        let header = jsonwebtoken::decode_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| TokenVerificationError::invalid("token header has no key id"))?;

        let keys = self.fetch_keys().await?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| TokenVerificationError::UnknownKey(kid.clone()))?;
        let key = DecodingKey::from_jwk(jwk)?;

        let data = jsonwebtoken::decode::<IdentityClaims>(token, &key, &self.validation())?;
        if data.claims.sub.is_empty() {
            return Err(TokenVerificationError::invalid("token has an empty subject"));
        }

        tracing::debug!(sub = %data.claims.sub, "identity token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "type": "service_account",
        "project_id": "parcel-app-1234",
        "client_email": "firebase-adminsdk@parcel-app-1234.iam.gserviceaccount.com"
    }"#;

    #[test]
    fn parses_raw_json_bundle() {
        let account = ServiceAccount::from_bundle(BUNDLE).unwrap();
        assert_eq!(account.project_id, "parcel-app-1234");
        assert_eq!(account.account_type.as_deref(), Some("service_account"));
    }

    #[test]
    fn parses_base64_bundle() {
        let encoded = general_purpose::STANDARD.encode(BUNDLE);
        let account = ServiceAccount::from_bundle(&encoded).unwrap();
        assert_eq!(account.project_id, "parcel-app-1234");
    }

    #[test]
    fn rejects_bundle_without_project() {
        let err = ServiceAccount::from_bundle(r#"{"project_id": "  "}"#).unwrap_err();
        assert!(matches!(err, CredentialError::MissingProject));

        let err = ServiceAccount::from_bundle("%%%").unwrap_err();
        assert!(matches!(err, CredentialError::Encoding));
    }

    #[test]
    fn validation_pins_audience_and_issuer() {
        let account = ServiceAccount::from_bundle(BUNDLE).unwrap();
        let verifier = FirebaseTokenVerifier::new(&account);
        let validation = verifier.validation();
        assert!(validation.aud.unwrap().contains("parcel-app-1234"));
        assert!(
            validation
                .iss
                .unwrap()
                .contains("https://securetoken.google.com/parcel-app-1234")
        );
    }

    #[tokio::test]
    async fn token_without_key_id_is_rejected_before_any_fetch() {
        let account = ServiceAccount::from_bundle(BUNDLE).unwrap();
        // Unroutable URL: the request must never be attempted.
        let verifier = FirebaseTokenVerifier::with_jwks_url(&account, "http://127.0.0.1:1/keys");
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &serde_json::json!({"sub": "u", "exp": 4_000_000_000i64}),
            &jsonwebtoken::EncodingKey::from_secret(b"x"),
        )
        .unwrap();

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, TokenVerificationError::Invalid(_)));
    }
}

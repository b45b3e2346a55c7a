use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{IdentityClaims, TokenVerificationError};

/// Turns a bearer token into verified claims.
///
/// Implementations may call out to a remote provider; no retries are made.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<IdentityClaims, TokenVerificationError>;
}

/// Shared-secret (HS256) verifier for local development and tests.
pub struct Hs256TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for Hs256TokenVerifier {
    async fn verify(&self, token: &str) -> Result<IdentityClaims, TokenVerificationError> {
        let data = jsonwebtoken::decode::<IdentityClaims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

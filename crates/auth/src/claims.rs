use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decoded claim set of a verified identity token.
///
/// This is the minimal set of claims the service reads once a token has been
/// verified; providers may include more, which are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject / provider user identifier.
    pub sub: String,

    /// Email of the signed-in user, when the provider knows one.
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// Issued-at (seconds since the epoch).
    #[serde(default)]
    pub iat: i64,

    /// Expiration (seconds since the epoch).
    pub exp: i64,
}

impl IdentityClaims {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenVerificationError {
    #[error("token has expired")]
    Expired,

    #[error("token is invalid: {0}")]
    Invalid(String),

    #[error("token was signed with unknown key '{0}'")]
    UnknownKey(String),

    #[error("identity provider unavailable: {0}")]
    Provider(String),
}

impl TokenVerificationError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

impl From<jsonwebtoken::errors::Error> for TokenVerificationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid(err.to_string()),
        }
    }
}

use parcelhub_auth::IdentityClaims;

/// Verified identity of the caller, attached by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    claims: IdentityClaims,
}

impl IdentityContext {
    pub fn new(claims: IdentityClaims) -> Self {
        Self { claims }
    }

    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn email(&self) -> Option<&str> {
        self.claims.email()
    }
}

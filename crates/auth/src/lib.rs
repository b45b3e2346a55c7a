//! `parcelhub-auth`: identity verification boundary.
//!
//! Bearer tokens are opaque to the rest of the system: this crate turns one
//! into a verified claim set (or an error) and knows nothing about HTTP routing
//! or storage.

pub mod claims;
pub mod firebase;
pub mod roles;
pub mod verifier;

pub use claims::{IdentityClaims, TokenVerificationError};
pub use firebase::{CredentialError, FirebaseTokenVerifier, ServiceAccount};
pub use roles::Role;
pub use verifier::{Hs256TokenVerifier, TokenVerifier};

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role recorded on a user document.
///
/// Roles are free-text in storage; only the rider role is ever written by
/// the system itself (as a side effect of rider activation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const RIDER: Role = Role(Cow::Borrowed("rider"));

    pub fn rider() -> Self {
        Self::RIDER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

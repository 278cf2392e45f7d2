use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC (`admin`, `staff`, `viewer`).
///
/// Opaque at this layer; the API maps roles to permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_string() {
        let role = Role::new("staff");
        assert_eq!(role.to_string(), "staff");
        assert_eq!(role.as_str(), "staff");
    }
}

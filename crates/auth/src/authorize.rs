use thiserror::Error;

use medistock_core::UserId;

use crate::Permission;

/// A fully resolved principal for authorization decisions.
///
/// Built by the API layer from verified claims plus a role→permission policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Check that the principal holds `required` (or the `*` wildcard).
///
/// Pure policy check: no IO, no panics.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(perms: &[&'static str]) -> Principal {
        Principal {
            user_id: UserId::new(),
            permissions: perms.iter().map(|p| Permission::new(*p)).collect(),
        }
    }

    #[test]
    fn explicit_permission_is_granted() {
        let p = principal(&["stock.read"]);
        assert!(authorize(&p, &Permission::new("stock.read")).is_ok());
    }

    #[test]
    fn wildcard_grants_everything() {
        let p = principal(&["*"]);
        assert!(authorize(&p, &Permission::new("products.delete")).is_ok());
    }

    #[test]
    fn wildcard_is_only_the_bare_star() {
        let p = principal(&["stock.*"]);
        assert!(authorize(&p, &Permission::new("stock.exit")).is_err());
        assert!(Permission::wildcard().is_wildcard());
        assert!(!Permission::new("stock.*").is_wildcard());
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let p = principal(&["stock.read"]);
        assert_eq!(
            authorize(&p, &Permission::new("stock.exit")),
            Err(AuthzError::Forbidden("stock.exit".to_string()))
        );
    }
}

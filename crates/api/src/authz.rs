//! API-side authorization guard.
//!
//! Enforced in each handler before the service is invoked, keeping the
//! domain and infra crates auth-agnostic.

use medistock_auth::{AuthzError, Permission, Principal, Role, authorize};

use crate::context::PrincipalContext;

pub const STOCK_READ: &str = "stock.read";
pub const STOCK_ENTRY: &str = "stock.entry";
pub const STOCK_EXIT: &str = "stock.exit";
pub const PRODUCTS_READ: &str = "products.read";
pub const PRODUCTS_CREATE: &str = "products.create";
pub const PRODUCTS_DELETE: &str = "products.delete";

/// Check that the request's principal holds `required`.
pub fn require(principal: &PrincipalContext, required: &'static str) -> Result<(), AuthzError> {
    let principal = Principal {
        user_id: principal.user_id(),
        permissions: permissions_from_roles(principal.roles()),
    };

    authorize(&principal, &Permission::new(required)).inspect_err(|_| {
        tracing::info!(user_id = %principal.user_id, permission = required, "request denied");
    })
}

/// Static role→permission policy.
///
/// `admin` gets the wildcard; `staff` runs the stock room; `viewer` reads.
/// Unknown roles grant nothing.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    let mut perms: Vec<Permission> = Vec::new();

    for role in roles {
        let granted: &[&'static str] = match role.as_str() {
            "admin" => return vec![Permission::wildcard()],
            "staff" => &[STOCK_READ, STOCK_ENTRY, STOCK_EXIT, PRODUCTS_READ],
            "viewer" => &[STOCK_READ, PRODUCTS_READ],
            _ => &[],
        };

        for p in granted {
            let p = Permission::new(*p);
            if !perms.contains(&p) {
                perms.push(p);
            }
        }
    }

    perms
}

#[cfg(test)]
mod tests {
    use super::*;
    use medistock_core::UserId;

    fn ctx(roles: &[&'static str]) -> PrincipalContext {
        PrincipalContext::new(UserId::new(), roles.iter().map(|r| Role::new(*r)).collect())
    }

    #[test]
    fn admin_is_allowed_everything() {
        assert!(require(&ctx(&["admin"]), PRODUCTS_DELETE).is_ok());
    }

    #[test]
    fn staff_moves_stock_but_cannot_manage_catalog() {
        let staff = ctx(&["staff"]);
        assert!(require(&staff, STOCK_EXIT).is_ok());
        assert!(require(&staff, PRODUCTS_READ).is_ok());
        assert!(require(&staff, PRODUCTS_CREATE).is_err());
        assert!(require(&staff, PRODUCTS_DELETE).is_err());
    }

    #[test]
    fn viewer_is_read_only() {
        let viewer = ctx(&["viewer"]);
        assert!(require(&viewer, STOCK_READ).is_ok());
        assert!(require(&viewer, STOCK_ENTRY).is_err());
    }

    #[test]
    fn roles_combine_without_duplicates() {
        let perms = permissions_from_roles(&[
            Role::new("staff"),
            Role::new("viewer"),
            Role::new("nobody"),
        ]);
        assert_eq!(perms.len(), 4);
    }
}

//! `medistock-auth`: bearer-token authentication and RBAC policy checks.
//!
//! Decoupled from HTTP and storage: the API layer extracts the token and maps
//! roles to permissions, this crate verifies and decides.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use roles::Role;

//! Token-based authentication and role authorization.

pub mod claims;
pub mod gate;
pub mod role;
pub mod token;

pub use claims::{Claims, ISSUER};
pub use gate::require;
pub use role::Role;
pub use token::{AuthError, RoleCheck, TokenService};

#[cfg(test)]
pub(crate) use token::testing;

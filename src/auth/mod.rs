/// Authentication module
///
/// Handles JWT issuance/validation for access and refresh tokens,
/// password hashing, and the register/login/refresh flows.

mod claims;
mod jwt;
mod password;
mod service;

pub use claims::{Claims, Identity};
pub use jwt::TokenIssuer;
pub use password::{hash_password, validate_password, verify_password};
pub use service::{AuthService, AuthSession};

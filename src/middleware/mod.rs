/// Middleware module
///
/// Custom middleware for access-token authentication.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;

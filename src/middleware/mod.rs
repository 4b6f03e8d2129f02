/// Middleware module
///
/// Authentication for the guarded account routes.
mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;

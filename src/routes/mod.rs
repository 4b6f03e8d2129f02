mod accounts;
mod health_check;

pub use accounts::{configure_role, ForgetPasswordRequest, LoginRequest, REFRESH_COOKIE};
pub use health_check::health_check;

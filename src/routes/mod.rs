mod auth;
mod health_check;

pub use auth::{
    auth_fallback, get_current_user, login, method_not_allowed, not_found, refresh, register,
    ApiResponse, AuthData, TokenData, UserData,
};
pub use health_check::health_check;

/// Error Handling Module
///
/// Every failure in the service maps onto `AppError`. Handlers return
/// `Result<HttpResponse, AppError>` and the `ResponseError` implementation
/// turns the error into the uniform `{"success": false, "error": "..."}` body.
/// It covers:
/// 1. Domain-Specific Error Types (validation, auth, store, config)
/// 2. Unified Application Error Type
/// 3. HTTP Response Mapping with structured logging
/// 4. Error Context for request-scoped logs
///
/// Error responses are logged once, by `LoggerMiddleware`, under the same
/// request id that is returned in the `x-request-id` header.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

pub const MSG_MISSING_REGISTRATION_FIELDS: &str = "缺少必要的注册信息";
pub const MSG_MISSING_LOGIN_CREDENTIALS: &str = "缺少登录凭据";
pub const MSG_INVALID_CREDENTIALS: &str = "邮箱或密码错误";
pub const MSG_MISSING_REFRESH_TOKEN: &str = "缺少刷新令牌";
pub const MSG_INVALID_REFRESH_TOKEN: &str = "无效的刷新令牌";
pub const MSG_MISSING_ACCESS_TOKEN: &str = "缺少访问令牌";
pub const MSG_INVALID_ACCESS_TOKEN: &str = "令牌已过期或无效";
pub const MSG_AUTHENTICATION_REQUIRED: &str = "需要身份验证";
pub const MSG_EMAIL_TAKEN: &str = "该邮箱已被注册";
pub const MSG_NOT_FOUND: &str = "API端点未找到";
pub const MSG_METHOD_NOT_ALLOWED: &str = "方法不允许";
pub const MSG_INTERNAL: &str = "服务器内部错误";
pub const MSG_BAD_REQUEST: &str = "请求参数验证失败";

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for request input
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingRegistrationFields,
    MissingLoginCredentials,
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    SuspiciousContent(&'static str),
    /// Body could not be parsed; the detail is logged, never returned
    MalformedBody(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingRegistrationFields => {
                write!(f, "{}", MSG_MISSING_REGISTRATION_FIELDS)
            }
            ValidationError::MissingLoginCredentials => {
                write!(f, "{}", MSG_MISSING_LOGIN_CREDENTIALS)
            }
            ValidationError::EmptyField(field) => write!(f, "{} 不能为空", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} 长度不能少于 {} 个字符", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} 长度不能超过 {} 个字符", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} 格式无效", field),
            ValidationError::SuspiciousContent(field) => write!(f, "{} 包含非法字符", field),
            ValidationError::MalformedBody(_) => write!(f, "{}", MSG_BAD_REQUEST),
        }
    }
}

impl StdError for ValidationError {}

/// Authentication errors. Every variant maps to 401.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are indistinguishable
    InvalidCredentials,
    MissingRefreshToken,
    InvalidRefreshToken,
    MissingToken,
    TokenInvalid,
    TokenExpired,
    /// Token was valid but its user is gone from the store
    UnknownUser,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "{}", MSG_INVALID_CREDENTIALS),
            AuthError::MissingRefreshToken => write!(f, "{}", MSG_MISSING_REFRESH_TOKEN),
            AuthError::InvalidRefreshToken => write!(f, "{}", MSG_INVALID_REFRESH_TOKEN),
            AuthError::MissingToken => write!(f, "{}", MSG_MISSING_ACCESS_TOKEN),
            AuthError::TokenInvalid | AuthError::TokenExpired => {
                write!(f, "{}", MSG_INVALID_ACCESS_TOKEN)
            }
            AuthError::UnknownUser => write!(f, "{}", MSG_AUTHENTICATION_REQUIRED),
        }
    }
}

impl StdError for AuthError {}

/// Credential store errors
#[derive(Debug)]
pub enum StoreError {
    DuplicateEmail(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateEmail(email) => write!(f, "Duplicate email: {}", email),
            StoreError::Backend(msg) => write!(f, "Credential store error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Configuration errors, raised at startup only
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    Load(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::Load(msg) => write!(f, "Config load error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Auth(AuthError),
    Store(StoreError),
    Config(ConfigError),
    NotFound,
    MethodNotAllowed,
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::NotFound => write!(f, "{}", MSG_NOT_FOUND),
            AppError::MethodNotAllowed => write!(f, "{}", MSG_METHOD_NOT_ALLOWED),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Uniform error body
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Converts errors to HTTP responses with request-scoped logging
pub trait ErrorHandler {
    fn error_response(&self) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self) -> (StatusCode, ErrorResponse) {
        let message = match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Auth(e) => e.to_string(),
            AppError::Store(StoreError::DuplicateEmail(_)) => MSG_EMAIL_TAKEN.to_string(),
            AppError::NotFound => MSG_NOT_FOUND.to_string(),
            AppError::MethodNotAllowed => MSG_METHOD_NOT_ALLOWED.to_string(),
            // Internal details stay in the logs
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                MSG_INTERNAL.to_string()
            }
        };

        (ResponseError::status_code(self), ErrorResponse::new(message))
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(ValidationError::MalformedBody(detail)) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %detail,
                    "Malformed request body"
                );
            }
            AppError::Validation(e) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %e,
                    "Validation error"
                );
            }
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => {
                    tracing::warn!(
                        request_id = request_id,
                        error = ?e,
                        "Invalid credentials attempt"
                    );
                }
                _ => {
                    tracing::warn!(
                        request_id = request_id,
                        error = ?e,
                        "Authentication error"
                    );
                }
            },
            AppError::Store(StoreError::DuplicateEmail(_)) => {
                tracing::warn!(request_id = request_id, "Duplicate registration attempt");
            }
            AppError::Store(e) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Credential store error"
                );
            }
            AppError::Config(e) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Configuration error"
                );
            }
            AppError::NotFound | AppError::MethodNotAllowed => {
                tracing::debug!(request_id = request_id, error = %self, "Routing error");
            }
            AppError::Internal(msg) => {
                tracing::error!(
                    request_id = request_id,
                    error = %msg,
                    "Internal error"
                );
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, body) = <Self as ErrorHandler>::error_response(self);

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(StoreError::DuplicateEmail(_)) => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Request-scoped context for log correlation
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(request_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            operation: operation.into(),
        }
    }

    pub fn log_error(&self, error: &AppError) {
        tracing::debug!(
            request_id = %self.request_id,
            operation = %self.operation,
            error = %error,
            "Operation failed"
        );
    }
}

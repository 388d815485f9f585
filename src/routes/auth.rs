/// Authentication Routes
///
/// Register, login, token refresh and current-user lookup under
/// `/api/auth`. Successful responses are wrapped as
/// `{"success": true, "data": ...}`; failures go through `AppError`.

use actix_web::{http::Method, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, AuthSession, Claims};
use crate::error::{AppError, AuthError, ErrorContext};
use crate::logger::RequestId;
use crate::store::PublicUser;

/// Fields are optional so a missing field reaches the service as blank and
/// gets the operation-specific message instead of a parse error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// The token is kept as raw JSON so a non-string value is rejected as an
/// invalid token rather than a malformed body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<serde_json::Value>,
}

impl RefreshRequest {
    fn token(&self) -> Result<&str, AuthError> {
        match &self.refresh_token {
            None | Some(serde_json::Value::Null) => Ok(""),
            Some(serde_json::Value::String(token)) => Ok(token.as_str()),
            Some(_) => Err(AuthError::InvalidRefreshToken),
        }
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Tokens and user returned by register and login
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user: PublicUser,
    pub token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl AuthData {
    fn new(session: AuthSession, expires_in: i64) -> Self {
        Self {
            user: session.user,
            token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in,
        }
    }
}

#[derive(Serialize)]
pub struct TokenData {
    pub token: String,
}

#[derive(Serialize)]
pub struct UserData {
    pub user: PublicUser,
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// POST /api/auth/register
///
/// # Errors
/// - 400: missing or malformed field
/// - 409: email already registered
/// - 500: internal server error
pub async fn register(
    form: web::Json<RegisterRequest>,
    service: web::Data<AuthService>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id.0, "user_registration");

    let session = service
        .register(field(&form.email), field(&form.password), field(&form.full_name))
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %session.user.id,
        "Registration completed"
    );

    let expires_in = service.issuer().access_token_expiry();
    Ok(HttpResponse::Created().json(ApiResponse::ok(AuthData::new(session, expires_in))))
}

/// POST /api/auth/login
///
/// # Errors
/// - 400: missing credentials
/// - 401: unknown email or wrong password (same body for both)
/// - 500: internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id.0, "user_login");

    let session = service
        .login(field(&form.email), field(&form.password))
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %session.user.id,
        "Login completed"
    );

    let expires_in = service.issuer().access_token_expiry();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(AuthData::new(session, expires_in))))
}

/// POST /api/auth/refresh
///
/// Only ever answers 200 or 401: an unreadable body counts as a missing
/// token (see `refresh_json_config` in startup).
///
/// # Errors
/// - 401: missing, malformed, foreign-secret or expired refresh token
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    service: web::Data<AuthService>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id.0, "token_refresh");

    let result = match form.token() {
        Ok(token) => service.refresh(token).await,
        Err(e) => Err(e.into()),
    };
    let token = result.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(TokenData { token })))
}

/// GET /api/auth/me
///
/// **Requires a valid access token**; claims are injected by `JwtMiddleware`.
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user = service.current_user(&claims).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(UserData { user })))
}

/// Fallback for unmatched paths under `/api/auth`: non-POST methods get 405,
/// unknown POST endpoints get 404.
pub async fn auth_fallback(req: HttpRequest) -> Result<HttpResponse, AppError> {
    if *req.method() != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }
    Err(AppError::NotFound)
}

pub async fn method_not_allowed() -> Result<HttpResponse, AppError> {
    Err(AppError::MethodNotAllowed)
}

pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refresh_request(body: serde_json::Value) -> RefreshRequest {
        serde_json::from_value(body).expect("Failed to parse refresh request")
    }

    #[test]
    fn test_refresh_token_string_is_passed_through() {
        let request = refresh_request(serde_json::json!({"refreshToken": "abc"}));
        assert_eq!(request.token().unwrap(), "abc");
    }

    #[test]
    fn test_refresh_token_absent_or_null_is_blank() {
        assert_eq!(refresh_request(serde_json::json!({})).token().unwrap(), "");
        assert_eq!(
            refresh_request(serde_json::json!({"refreshToken": null})).token().unwrap(),
            ""
        );
    }

    #[test]
    fn test_refresh_token_of_wrong_type_is_invalid() {
        for value in [serde_json::json!(123), serde_json::json!(["a"]), serde_json::json!({})] {
            let request = refresh_request(serde_json::json!({"refreshToken": value}));
            assert_eq!(request.token(), Err(AuthError::InvalidRefreshToken));
        }
    }
}

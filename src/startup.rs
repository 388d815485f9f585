use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::error::{AppError, AuthError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    auth_fallback, get_current_user, health_check, login, method_not_allowed, not_found, refresh,
    register,
};

/// Request bodies are small JSON documents
const MAX_JSON_PAYLOAD: usize = 16 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_PAYLOAD)
        .error_handler(|err, _req| {
            AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
        })
}

/// Refresh answers 401 for anything it cannot read a token from
fn refresh_json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_PAYLOAD)
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "Unreadable refresh request body");
            AppError::Auth(AuthError::MissingRefreshToken).into()
        })
}

/// Mount the `/api/auth` routes
pub fn configure_auth(cfg: &mut web::ServiceConfig, service: &web::Data<AuthService>) {
    let issuer = service.issuer().clone();

    cfg.service(
        web::scope("/api/auth")
            .app_data(json_config())
            .service(
                web::resource("/register")
                    .route(web::post().to(register))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/login")
                    .route(web::post().to(login))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/refresh")
                    .app_data(refresh_json_config())
                    .route(web::post().to(refresh))
                    .default_service(web::to(method_not_allowed)),
            )
            // Protected route (requires access token); other methods get 405
            // without a token check
            .service(
                web::resource("/me")
                    .route(
                        web::get()
                            .to(get_current_user)
                            .wrap(JwtMiddleware::new(issuer)),
                    )
                    .default_service(web::to(method_not_allowed)),
            )
            .default_service(web::to(auth_fallback)),
    );
}

pub fn run(listener: TcpListener, service: AuthService) -> Result<Server, std::io::Error> {
    let service = web::Data::new(service);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())      // Standard logging
            .wrap(LoggerMiddleware)       // Request id + latency

            // Shared state
            .app_data(service.clone())

            .route("/health_check", web::get().to(health_check))
            .configure(|cfg| configure_auth(cfg, &service))
            .default_service(web::to(not_found))
    })
    .listen(listener)?
    .run();

    Ok(server)
}

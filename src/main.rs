use std::net::TcpListener;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tribridge_auth::auth::AuthService;
use tribridge_auth::configuration::get_configuration;
use tribridge_auth::startup::run;
use tribridge_auth::store::{CredentialStore, InMemoryCredentialStore, PgCredentialStore};
use tribridge_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    // Secrets are mandatory; refuse to start without them
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!(jwt = ?config.jwt, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Configuration error: {}", e),
            ));
        }
    };

    let store: Arc<dyn CredentialStore> = match &configuration.database {
        Some(database) => {
            tracing::info!("Attempting to connect to database");

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Database connection error",
                    )
                })?;

            let store = PgCredentialStore::new(pool);
            store.migrate().await.map_err(|e| {
                tracing::error!("Failed to migrate database: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
            })?;

            tracing::info!("Using Postgres credential store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("No database configured, users are kept in memory");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let service = AuthService::new(store, &configuration.jwt, &configuration.password)
        .map_err(|e| {
            tracing::error!("Failed to initialise auth service: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Auth service error")
        })?;

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, service)?;
    server.await
}

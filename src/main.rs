use std::net::TcpListener;
use std::sync::Arc;

use author_hub::accounts::{AccountStore, InMemoryAccountStore, PostgresAccountStore};
use author_hub::configuration::{get_configuration, DatabaseSettings};
use author_hub::email_client::EmailClient;
use author_hub::startup::run;
use author_hub::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = init_telemetry() {
        eprintln!("Failed to initialise telemetry: {}", e);
    }

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(invalid_input("Configuration error"));
        }
    };

    if let Err(e) = configuration.jwt.validate() {
        tracing::error!("Invalid JWT configuration: {}", e);
        return Err(invalid_input("Configuration error"));
    }

    let store = account_store(&configuration.database).await?;

    let mailer = EmailClient::from_settings(&configuration.email_client).map_err(|e| {
        tracing::error!("Failed to build email client: {}", e);
        invalid_input("Email client configuration error")
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, store, Arc::new(mailer), configuration)?;
    tracing::info!("Server started successfully");

    server.await
}

async fn account_store(settings: &DatabaseSettings) -> std::io::Result<Arc<dyn AccountStore>> {
    if settings.in_memory {
        tracing::warn!("Using the in-memory account store; accounts are lost on restart");
        return Ok(Arc::new(InMemoryAccountStore::new()));
    }

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;
    tracing::info!("Database connection pool created successfully");

    let store = PostgresAccountStore::new(pool);
    store.migrate().await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
    })?;

    Ok(Arc::new(store))
}

fn invalid_input(message: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, message.to_string())
}

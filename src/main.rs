use actix_cors::Cors;
use actix_web::{middleware, App, HttpServer};
use pugorugh::config::{LoggingSettings, Settings, StorageBackend};
use pugorugh::services::{seed_catalog, AdoptionStore, MemoryStore, PostgresStore, TokenIssuer};
use pugorugh::{configure_app, AppState};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Configuration error: {}", e),
        )
    })?;

    init_logging(&settings.logging);

    info!("Starting Pug or Ugh matching service...");

    let store: Arc<dyn AdoptionStore> = match settings.storage.backend {
        StorageBackend::Postgres => {
            let db = &settings.database;
            let postgres = PostgresStore::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                db.max_connections.unwrap_or(10)
            );
            Arc::new(postgres)
        }
        StorageBackend::Memory => {
            warn!(
                "Using the in-memory store, data will not survive a restart and tokens \
                 issued before one may resolve to a different user"
            );
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(seed_file) = &settings.storage.seed_file {
        seed_catalog(store.as_ref(), seed_file).await.map_err(|e| {
            error!("Failed to seed catalog from {}: {}", seed_file.display(), e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;
    }

    if settings.auth.jwt_secret.len() < 32 {
        warn!("auth.jwt_secret is shorter than 32 bytes, use a longer secret in production");
    }

    let tokens = Arc::new(TokenIssuer::new(
        &settings.auth.jwt_secret,
        settings.auth.token_ttl_secs,
    ));

    // Build application state
    let app_state = AppState { store, tokens };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .configure(configure_app(app_state.clone()))
            .wrap(middleware::NormalizePath::trim())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

use actix_middleware::{Logging, MetricsMiddleware};
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_service::{
    config::Config,
    db::{create_pool, run_migrations, PgClinicRepository},
    policy::PolicyTable,
    routes, AppState,
};
use crypto_core::JwtCodec;

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    tracing::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_tracing(config.is_production());

    tracing::info!("Starting clinic-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let ttl = chrono::Duration::hours(config.jwt.ttl_hours);
    let codec = JwtCodec::new(config.jwt.secret.as_bytes(), ttl)
        .map_err(|e| startup_error("Invalid JWT configuration", e))?;
    let codec = Arc::new(codec);
    tracing::info!(ttl_hours = config.jwt.ttl_hours, "JWT codec initialized");

    let db_pool = create_pool(&config.database.url, config.database.max_connections)
        .await
        .map_err(|e| startup_error("Failed to create database pool", e))?;
    tracing::info!(
        "Database pool created with {} max connections",
        config.database.max_connections
    );

    tracing::info!("Running database migrations...");
    run_migrations(&db_pool)
        .await
        .map_err(|e| startup_error("Database migrations failed", e))?;
    tracing::info!("Database migrations completed");

    let state = web::Data::new(AppState::new(
        Arc::new(PgClinicRepository::new(db_pool)),
        codec.clone(),
        PolicyTable::default(),
        config.upload.clone(),
    ));

    let (host, port) = config.bind_address();
    tracing::info!("Listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::configure(codec.clone()))
            .wrap(Logging)
            .wrap(MetricsMiddleware)
            .wrap(TracingLogger::default())
            .wrap(Logger::default())
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

use std::{env, io};

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use portfolio_contact::{
    background_task::start_purge_task,
    graceful_shutdown::stop_on_signal,
    limiter::RateLimitBackend,
    middlewares::cors::cors_policy,
    routes::configure_routes,
    settings::AppConfig,
    telemetry::init_tracing,
    AppState,
};
use tokio::time::Duration;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let production = env::var("APP_ENV").is_ok_and(|v| v.eq_ignore_ascii_case("production"));
    init_tracing(production);

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let rate_limiter = RateLimitBackend::from_config(&config)
        .await
        .map_err(|e| io::Error::other(format!("Failed to initialise rate limiter: {e:#}")))?;

    if let RateLimitBackend::Memory(store) = &rate_limiter {
        let every = Duration::from_secs(config.rate_limit_purge_interval_secs);
        tokio::spawn(start_purge_task(store.clone(), every));
    }

    let app_state = web::Data::new(
        AppState::new(&config, rate_limiter)
            .map_err(|e| io::Error::other(format!("Failed to build application state: {e:#}")))?
    );

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "🚀 Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let origins = config.cors_origins();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(cors_policy(&origins))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .disable_signals()
    .bind(server_addr)?
    .run();

    tokio::spawn(stop_on_signal(server.handle()));

    server.await
}

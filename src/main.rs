use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use pbkit::config::Config;
use pbkit::server;
use std::env;
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[actix_web::main]
async fn main() -> IoResult<()> {
    // Load `.env` before anything reads the environment.
    dotenvy::dotenv().ok();

    // Initialize logger.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse configuration.
    let config_path =
        PathBuf::from(env::var("CONFIG").unwrap_or_else(|_| String::from("config.toml")));
    let config = Config::parse(&config_path).map_err(|e| {
        IoError::new(
            IoErrorKind::InvalidInput,
            format!("failed to parse config {}: {e}", config_path.display()),
        )
    })?;
    let server_config = config.server.clone();
    tracing::info!("serving on {}", server_config.address);

    // Create a HTTP server.
    let config = web::Data::new(config);
    let mut http_server = HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .wrap(Logger::default())
            .configure(server::configure_routes)
    })
    .bind(&server_config.address)?;

    // Set worker count for the server.
    if let Some(workers) = server_config.workers {
        http_server = http_server.workers(workers);
    }

    // Run the server.
    http_server.run().await
}

use actix_web::{App, HttpServer, web};
use log::{info, warn};
use std::path::Path;

use sheet_store::api::{configure, cors_headers};
use sheet_store::app_state::AppState;
use sheet_store::config::{AppConfig, LoggingConfig};

fn init_logging(config: &LoggingConfig) {
    if Path::new(&config.config_file).exists() {
        if let Err(e) = log4rs::init_file(&config.config_file, Default::default()) {
            eprintln!("Failed to load log config {}: {}", config.config_file, e);
            env_logger::init();
        }
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        warn!("Log config {} not found, logging to stderr", config.config_file);
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    init_logging(&config.logging);
    config.log_summary();

    let app_state = AppState::from_config(config.clone());
    let server = config.server.clone();
    info!("Starting server on {}:{}", server.host, server.port);

    let cors = server.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(cors_headers(&cors))
            .app_data(web::Data::new(app_state.clone()))
            .configure(configure)
    })
    .workers(server.workers)
    .bind((server.host.as_str(), server.port))?
    .run()
    .await
}

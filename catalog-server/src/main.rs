use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use catalog::CatalogDb;

mod config;
mod handlers;

use config::ServerConfig;

/// Shared application state
pub struct AppState {
    pub catalog: CatalogDb,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    log::info!("Starting product catalog server");

    let config = ServerConfig::from_env();

    log::info!("Opening catalog at: {}", config.db_path);
    let catalog = config.open_catalog().map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState { catalog });
    let max_upload_bytes = config.max_upload_bytes;

    log::info!("Listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

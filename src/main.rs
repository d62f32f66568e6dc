use std::sync::Arc;

use actix_web::middleware::{Logger, from_fn};
use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;

use pushkind_bsr::keepa::{KeepaClient, ProductApi};
use pushkind_bsr::middleware::{InboundLimiter, limit_requests, setup_cors};
use pushkind_bsr::models::config::ServerConfig;
use pushkind_bsr::routes::configure;
use pushkind_bsr::services::batches::{Pacer, TokioPacer};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let server_config = match ServerConfig::load() {
        Ok(server_config) => server_config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let api: Arc<dyn ProductApi> = Arc::new(KeepaClient::from_config(&server_config));
    let pacer: Arc<dyn Pacer> = Arc::new(TokioPacer);
    let address = format!("{}:{}", server_config.bind_address, server_config.port);

    log::info!(
        "Starting server on {address} ({} environment)",
        server_config.environment
    );
    log::info!("Keepa API key: {}", server_config.masked_api_key());

    let limiter = web::Data::new(InboundLimiter::new(
        server_config.rate_limit_window(),
        server_config.rate_limit_max,
    ));
    let api = web::Data::new(api);
    let pacer = web::Data::new(pacer);
    let server_config = web::Data::new(server_config);

    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(limit_requests))
            .wrap(setup_cors(&server_config.allowed_origins))
            .wrap(Logger::default())
            .app_data(limiter.clone())
            .app_data(api.clone())
            .app_data(pacer.clone())
            .app_data(server_config.clone())
            .configure(configure)
    })
    .bind(address)?
    .run()
    .await
}

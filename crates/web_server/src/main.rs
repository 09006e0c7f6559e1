//! Main entry point for the listing search backend server.
//! This crate wires the services together, keeps calendars in sync in the
//! background and serves the REST API.

use actix_web::{App, HttpServer, middleware::Logger, web};
use calendar_sync::CalendarRefresher;
use postgres::database::*;
use web_handlers::configure_routes;

/// Environment configuration
mod config;
use config::AppConfig;

/// Service wiring
mod services;
use services::AppServices;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting listing search server...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Create database connection pool
    let pool = match create_connection_pool(&config.database_url).await {
        Ok(pool) => {
            log::info!("🗃️ Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("❌ Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("❌ Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        log::error!("❌ Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let services = match AppServices::build(&config, pool) {
        Ok(services) => services,
        Err(e) => {
            log::error!("❌ Failed to initialize services: {}", e);
            std::process::exit(1);
        }
    };

    // Keep calendars in sync in the background
    let mut refresher = CalendarRefresher::new(services.calendars.clone());
    refresher.start();

    let state = services.state();
    log::info!(
        "🌐 Server will be available at: http://{}",
        config.bind_address
    );

    let result = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(&config.bind_address)?
    .run()
    .await;

    refresher.stop().await;
    log::info!("👋 Server stopped");

    result
}

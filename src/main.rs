mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod notifications;
mod requests;
mod resources;
mod routes;
mod state;
mod utils;

#[cfg(test)]
mod testing;

use actix_web::{middleware, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};
use std::io;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::PgStore;
use crate::state::AppState;
use crate::utils::permissions::Permission;
use crate::utils::s3::{create_s3_client, S3MediaStore};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|err| {
        error!("Invalid configuration: {}", err);
        io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
    })?;

    let pool = db::create_pool(&config.database_url).await.map_err(|err| {
        error!("Failed to connect to the database: {}", err);
        io::Error::new(io::ErrorKind::ConnectionRefused, err.to_string())
    })?;
    db::run_migrations(&pool).await.map_err(|err| {
        error!("Failed to run migrations: {}", err);
        io::Error::new(io::ErrorKind::Other, err.to_string())
    })?;

    let media = S3MediaStore::new(
        create_s3_client().await,
        config.s3_bucket.clone(),
        config.media_base_url.clone(),
    );

    let (notifier, queue) = notifications::queue();
    let _mailer = notifications::spawn_mailer(queue, config.app_name.clone());

    let bind_address = config.bind_address.clone();
    let state = AppState::new(
        config,
        Arc::new(PgStore::new(pool)),
        Arc::new(media),
        Arc::new(notifier),
    );

    let permissions: Vec<String> = Permission::all().iter().map(ToString::to_string).collect();
    info!("Role store must grant from: {}", permissions.join(", "));
    info!("Starting server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .bind(&bind_address)?
    .run()
    .await
}

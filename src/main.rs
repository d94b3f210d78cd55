mod config;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
#[cfg(test)]
mod test_support;

use actix_web::{middleware::Logger, App, HttpServer};
use anyhow::Context;
use config::Config;
use handlers::db::{check_db_connection, PgStore, Store};
use handlers::token::TokenCodec;
use log::{error, info};
use middleware::request_logger::RequestLogger;
use routes::config_app;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("=== Bookstore API Server Starting ===");

    let config = Config::from_env().context("load config failed")?;
    info!("Loaded configuration: {:?}", config);

    // A bad key is fatal here rather than on the first login.
    let codec = Arc::new(
        TokenCodec::new(&config.token_symmetric_key).context("cannot create token codec")?,
    );

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to Postgres: {}", e);
            e
        })
        .context("connect db failed")?;

    if check_db_connection(&pool).await {
        info!("Database connection established and verified");
    } else {
        info!("Database connection established but verification failed");
    }

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrate up")?;
    info!("db migrated successfully");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let address = config.http_server_address.clone();
    info!("start HTTP server at {}", address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t [%s] \"%r\" %b %D ms \"%{User-Agent}i\" %a"))
            .wrap(RequestLogger)
            .configure(config_app(store.clone(), config.clone(), codec.clone()))
    })
    .bind(&address)
    .with_context(|| format!("cannot bind {address}"))?
    .run()
    .await
    .context("HTTP server failed")?;

    info!("HTTP server is stopped");
    Ok(())
}

mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod storage;
mod utils;

use std::io;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use chrono::Local;
use log::info;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::middleware::RequestLogging;
use crate::routes::{api_v1_routes, checkout_routes, public_routes};
use crate::services::SipsClient;
use crate::state::AppState;
use crate::storage::PgCheckoutStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    let mut log_builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    log_builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S %:z"),
                record.level(),
                record.args()
            )
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e)) // 转换为 io::Result
        })
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    // 初始化数据库连接池并执行迁移
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let gateway = SipsClient::new(config.sips.timeout)?;

    info!(
        "SIPS gateway {} in {} mode, merchant {}, seal {}",
        config.sips.interface_version,
        config.sips.mode,
        config.sips.merchant_id,
        config.sips.seal_algorithm.as_str()
    );

    let bind_address = config.bind_address();
    let workers = config.server.workers;
    let app_state = web::Data::new(AppState::new(
        Arc::new(PgCheckoutStore::new(pool)),
        Arc::new(gateway),
        config,
    ));

    info!("Starting server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(RequestLogging)
            .service(api_v1_routes())
            .service(checkout_routes())
            .service(public_routes())
    });

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await?;

    info!("Server stopped");
    Ok(())
}

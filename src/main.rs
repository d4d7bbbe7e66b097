use std::io;

use dotenvy::dotenv;
use marketplace_orders::config::Config;
use marketplace_orders::infrastructure::pg_store::DieselStore;
use marketplace_orders::{build_server, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(io::Error::other)?;

    let pool = create_pool(&config.database_url, config.pool_size).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    log::info!(
        "Starting server at http://{}:{} (pool size {})",
        config.host,
        config.port,
        config.pool_size
    );

    build_server(DieselStore::new(pool), &config.host, config.port)?.await
}

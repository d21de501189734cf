use wrench::config::Config;
use wrench::db::PgPool;
use wrench::engine::Engine;
use wrench::error::Error;
use wrench::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let PgPool(pool) = PgPool::new(&config.database_url, config.max_connections).await?;

    let engine = Engine::new(pool, &config).await?;

    serve(engine, config.listen_addr).await
}
